// Particle Scene: rigid-body particles mirrored onto a rendered scene

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod rendering;
pub mod scene;
pub mod utils;
pub mod world;

// Re-export commonly used types for convenience
pub use config::{SceneSettings, SimulationConfig};
pub use error::{ConfigError, RenderError, SceneError};
pub use rendering::{HeadlessSurface, RenderSurface};
pub use scene::{FrameReport, Scene};
pub use world::{InputHandle, SimulationWorld};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
