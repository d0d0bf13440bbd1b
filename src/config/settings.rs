use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::simulation::SimulationConfig;
use crate::error::ConfigError;

const SETTINGS_FILE: &str = "scene.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidViewport { width: self.width, height: self.height });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPathSettings {
    pub waypoints: Vec<[f32; 3]>,
    /// Seconds spent on each segment.
    pub segment_duration: f64,
    pub look_at: [f32; 3],
}

impl Default for CameraPathSettings {
    fn default() -> Self {
        Self {
            waypoints: vec![
                [18.0, 9.0, 0.0],
                [0.0, 12.0, 18.0],
                [-18.0, 9.0, 0.0],
                [0.0, 6.0, -18.0],
            ],
            segment_duration: 5.0,
            look_at: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderQuality {
    Simplified,
    Standard,
    Enhanced,
}

impl Default for ShaderQuality {
    fn default() -> Self {
        Self::Standard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadingSettings {
    pub quality: ShaderQuality,
    /// Rate applied to scene time by the particle surface program.
    pub surface_time_rate: f32,
    /// Rate applied to scene time by the backdrop program.
    pub backdrop_time_rate: f32,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            quality: ShaderQuality::default(),
            surface_time_rate: 1.0,
            backdrop_time_rate: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub clear_color: [f32; 4],
    pub ground_color: [f32; 4],
    pub palette: Vec<[f32; 4]>,
    /// Optional backdrop image. Falls back to `clear_color` when missing or unreadable.
    pub background_texture: Option<PathBuf>,
    pub vsync: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.02, 0.02, 0.05, 1.0],
            ground_color: [0.25, 0.27, 0.3, 1.0],
            palette: vec![
                [0.95, 0.45, 0.25, 1.0],
                [0.25, 0.65, 0.95, 1.0],
                [0.55, 0.9, 0.4, 1.0],
                [0.95, 0.85, 0.3, 1.0],
                [0.75, 0.4, 0.9, 1.0],
            ],
            background_texture: None,
            vsync: true,
        }
    }
}

/// Construction-time parameters for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneSettings {
    pub viewport: Viewport,
    pub simulation: SimulationConfig,
    pub camera: CameraPathSettings,
    pub shading: ShadingSettings,
    pub rendering: RenderSettings,
}

impl SceneSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.viewport.validate()?;
        self.simulation.validate()?;
        if self.camera.waypoints.is_empty() {
            return Err(ConfigError::EmptyCameraPath);
        }
        let duration = self.camera.segment_duration;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ConfigError::InvalidSegmentDuration(duration));
        }
        Ok(())
    }
}

fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "particle-scene", "particle-scene")
        .map(|proj| proj.config_dir().join(SETTINGS_FILE))
}

pub fn save_scene_settings_to(settings: &SceneSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml = toml::to_string_pretty(settings)?;
    fs::write(path, toml)?;
    Ok(())
}

pub fn load_scene_settings_from(path: &Path) -> Result<SceneSettings, ConfigError> {
    let data = fs::read_to_string(path)?;
    toml::from_str::<SceneSettings>(&data).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Persist settings in the platform config directory.
pub fn save_scene_settings(settings: &SceneSettings) -> Result<(), ConfigError> {
    match settings_path() {
        Some(path) => save_scene_settings_to(settings, &path),
        None => {
            warn!("No config directory available, settings not saved");
            Ok(())
        }
    }
}

/// Settings from the platform config directory, if present and readable.
pub fn load_scene_settings() -> Option<SceneSettings> {
    let path = settings_path()?;
    if !path.exists() {
        return None;
    }
    match load_scene_settings_from(&path) {
        Ok(settings) => {
            info!("Loaded scene settings from {:?}", path);
            Some(settings)
        }
        Err(e) => {
            warn!("Ignoring unreadable settings file: {}", e);
            None
        }
    }
}
