pub mod settings;
pub mod simulation;

// Re-export commonly used types
pub use settings::{
    CameraPathSettings, RenderSettings, SceneSettings, ShaderQuality, ShadingSettings, Viewport,
    load_scene_settings, load_scene_settings_from, save_scene_settings, save_scene_settings_to,
};
pub use simulation::{
    GroundSettings, ParticleClass, SimulationConfig, SleepSettings, SpawnBounds, StepMode,
    DEFAULT_GRAVITY, DEFAULT_TIMESTEP,
};
