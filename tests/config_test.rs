use std::path::PathBuf;

use particle_scene::config::{
    load_scene_settings_from, save_scene_settings_to, ParticleClass, SceneSettings, ShaderQuality,
    SimulationConfig, SpawnBounds, StepMode,
};
use particle_scene::error::ConfigError;
use particle_scene::world::{BroadPhaseKind, MaterialTag};

fn temp_settings_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("particle-scene-test-{}", std::process::id()))
        .join(format!("{}.toml", name))
}

#[test]
fn test_particle_class_presets() {
    for class in [ParticleClass::Dust, ParticleClass::Pebble, ParticleClass::Crate] {
        let config = SimulationConfig::for_class(class);

        assert_eq!(config.particle_class, class);
        assert!(config.particle_count > 0);
        assert!(config.particle_count + config.ground.enabled as usize <= config.max_bodies);
        assert!(config.validate().is_ok());

        match class {
            ParticleClass::Dust => {
                assert_eq!(class.mass(), 0.1);
                assert_eq!(config.particle_count, 500);
            }
            ParticleClass::Pebble => {
                assert_eq!(class.mass(), 1.0);
                assert_eq!(config.particle_count, 300);
            }
            ParticleClass::Crate => {
                assert_eq!(class.mass(), 13.0);
                assert_eq!(class.material(), MaterialTag::Stone);
            }
        }
    }
}

#[test]
fn test_defaults_match_scene_parameters() {
    let settings = SceneSettings::default();
    assert_eq!(settings.simulation.particle_count, 300);
    assert_eq!(settings.simulation.gravity, [0.0, -9.81, 0.0]);
    assert!((settings.simulation.fixed_timestep - 1.0 / 60.0).abs() < f32::EPSILON);
    assert_eq!(settings.simulation.step_mode, StepMode::PerFrame);
    assert_eq!(settings.simulation.broad_phase, BroadPhaseKind::SweepAndPrune);
    assert_eq!(settings.camera.segment_duration, 5.0);
    assert_eq!(settings.camera.look_at, [0.0; 3]);
    assert_eq!(settings.shading.quality, ShaderQuality::Standard);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_validation_rejects_bad_parameters() {
    let mut settings = SceneSettings::default();
    settings.simulation.fixed_timestep = 0.0;
    assert!(matches!(settings.validate(), Err(ConfigError::InvalidTimestep(_))));

    let mut settings = SceneSettings::default();
    settings.simulation.particle_count = settings.simulation.max_bodies + 1;
    assert!(matches!(settings.validate(), Err(ConfigError::TooManyParticles { .. })));

    let mut settings = SceneSettings::default();
    settings.simulation.particle_count = settings.simulation.max_bodies;
    assert!(matches!(settings.validate(), Err(ConfigError::TooManyParticles { .. })));

    let mut settings = SceneSettings::default();
    settings.camera.waypoints.clear();
    assert!(matches!(settings.validate(), Err(ConfigError::EmptyCameraPath)));

    let mut settings = SceneSettings::default();
    settings.camera.segment_duration = -1.0;
    assert!(matches!(settings.validate(), Err(ConfigError::InvalidSegmentDuration(_))));

    let mut settings = SceneSettings::default();
    settings.simulation.spawn_bounds = SpawnBounds { min: [0.0, 5.0, 0.0], max: [1.0, 1.0, 1.0] };
    assert!(matches!(settings.validate(), Err(ConfigError::InvalidSpawnBounds { axis: 'y' })));

    let mut settings = SceneSettings::default();
    settings.simulation.step_mode = StepMode::Accumulated { max_substeps: 0 };
    assert!(matches!(settings.validate(), Err(ConfigError::InvalidSubsteps)));

    let mut settings = SceneSettings::default();
    settings.simulation.gravity = [0.0, f32::NAN, 0.0];
    assert!(matches!(settings.validate(), Err(ConfigError::InvalidGravity(_))));
}

#[test]
fn test_settings_round_trip_through_toml() {
    let path = temp_settings_path("round_trip");
    let mut settings = SceneSettings::default();
    settings.simulation = SimulationConfig::for_class(ParticleClass::Crate);
    settings.simulation.seed = Some(1234);
    settings.simulation.step_mode = StepMode::Accumulated { max_substeps: 5 };
    settings.shading.quality = ShaderQuality::Enhanced;
    settings.rendering.background_texture = Some(PathBuf::from("backdrop.png"));

    save_scene_settings_to(&settings, &path).unwrap();
    let loaded = load_scene_settings_from(&path).unwrap();
    assert_eq!(loaded, settings);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_negative_particle_count_fails_to_parse() {
    let path = temp_settings_path("negative_count");
    let settings = SceneSettings::default();
    save_scene_settings_to(&settings, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let edited = text.replace("particle_count = 300", "particle_count = -5");
    assert_ne!(text, edited);
    std::fs::write(&path, edited).unwrap();

    assert!(matches!(load_scene_settings_from(&path), Err(ConfigError::Parse { .. })));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_missing_settings_file_is_an_io_error() {
    let path = temp_settings_path("does_not_exist");
    assert!(matches!(load_scene_settings_from(&path), Err(ConfigError::Io(_))));
}

#[test]
fn test_ground_plane_counts_against_body_cap() {
    let mut config = SimulationConfig { max_bodies: 10, particle_count: 10, ..SimulationConfig::default() };
    assert!(config.ground.enabled);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::TooManyParticles { count: 11, max_bodies: 10 })
    ));

    config.particle_count = 9;
    assert!(config.validate().is_ok());

    config.particle_count = 10;
    config.ground.enabled = false;
    assert!(config.validate().is_ok());
}
