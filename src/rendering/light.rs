use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // Due to uniforms requiring 16 byte alignment, we need to add some padding.
    pub _padding: u32,
    pub color: [f32; 3],
    pub ambient: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub ambient: f32,
}

impl Light {
    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position.to_array(),
            _padding: 0,
            color: self.color.to_array(),
            ambient: self.ambient,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(8.0, 20.0, 6.0),
            color: Vec3::ONE,
            ambient: 0.15,
        }
    }
}
