pub mod camera;
pub mod engine;
pub mod light;
pub mod proxy;
pub mod shader_time;
pub mod shaders;
pub mod surface;
pub mod sync;

pub use camera::{Camera, CameraPath, CameraPathController, CameraUniform};
pub use engine::GpuRenderer;
pub use proxy::{RenderAttributes, Transform, VisualProxy, VisualProxyRegistry};
pub use shader_time::{ProgramId, ShaderTimeDriver, ShaderTimeState, TimeUniform};
pub use surface::{FrameRecord, HeadlessProbe, HeadlessSurface, RenderFrame, RenderSurface};
pub use sync::SyncBridge;
