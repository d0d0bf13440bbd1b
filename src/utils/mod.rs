pub mod logging;
pub mod math;

pub use math::{ray_plane, ray_sphere, Ray};
