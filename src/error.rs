use std::path::PathBuf;

/// Rejected scene configuration. A scene built from an invalid configuration never mounts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid viewport dimensions {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },
    #[error("Initial body count {count} (particles plus ground) exceeds the body cap of {max_bodies}")]
    TooManyParticles { count: usize, max_bodies: usize },
    #[error("Fixed timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
    #[error("Gravity vector must be finite, got {0:?}")]
    InvalidGravity([f32; 3]),
    #[error("Spawn bounds are inverted or non-finite on the {axis} axis")]
    InvalidSpawnBounds { axis: char },
    #[error("Camera path needs at least one waypoint")]
    EmptyCameraPath,
    #[error("Camera segment duration must be positive and finite, got {0}")]
    InvalidSegmentDuration(f64),
    #[error("Contact material {a:?}/{b:?}: {reason}")]
    InvalidMaterial {
        a: crate::world::MaterialTag,
        b: crate::world::MaterialTag,
        reason: &'static str,
    },
    #[error("Sleep thresholds must be non-negative and finite")]
    InvalidSleepThresholds,
    #[error("Accumulated step mode needs at least one substep")]
    InvalidSubsteps,
    #[error("Failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced by a scene instance.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Body/proxy count mismatch: {bodies} bodies, {proxies} proxies")]
    CountMismatch { bodies: usize, proxies: usize },
    #[error("Proxy at slot {slot} is paired with body {body}")]
    IndexMismatch { slot: usize, body: usize },
    #[error("Sync requested before any bodies exist")]
    EmptyWorld,
    #[error("Scene is already mounted")]
    AlreadyMounted,
    #[error("Scene has not been mounted")]
    NotMounted,
    #[error("Scene has been disposed")]
    Disposed,
}

impl SceneError {
    /// Invariant violations abort the scene; everything else leaves it intact.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SceneError::CountMismatch { .. } | SceneError::IndexMismatch { .. } | SceneError::EmptyWorld
        )
    }
}

/// Render-side failures. These are logged and degrade the frame, never the simulation.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Render surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("Failed to load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Render surface has been released")]
    Released,
}
