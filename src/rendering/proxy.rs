use glam::{Mat4, Quat, Vec3};

use crate::assets::{GeometryHandle, MaterialHandle};
use crate::error::SceneError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Transform {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderAttributes {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub color: [f32; 4],
    pub scale: Vec3,
}

/// Renderable counterpart of one physics body.
#[derive(Debug, Clone)]
pub struct VisualProxy {
    index: usize,
    transform: Transform,
    attributes: RenderAttributes,
}

impl VisualProxy {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn attributes(&self) -> &RenderAttributes {
        &self.attributes
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.attributes.scale, self.transform.orientation, self.transform.position)
    }

    // Only the sync bridge moves proxies.
    pub(in crate::rendering) fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }
}

/// Ordered proxies, slot `i` paired with body `i`.
#[derive(Debug, Default)]
pub struct VisualProxyRegistry {
    proxies: Vec<VisualProxy>,
}

impl VisualProxyRegistry {
    pub fn new() -> Self {
        Self { proxies: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { proxies: Vec::with_capacity(capacity) }
    }

    /// Append the proxy for `body_index`. The body must be the next one without a proxy.
    pub fn insert(
        &mut self,
        body_index: usize,
        transform: Transform,
        attributes: RenderAttributes,
    ) -> Result<usize, SceneError> {
        let slot = self.proxies.len();
        if body_index != slot {
            return Err(SceneError::IndexMismatch { slot, body: body_index });
        }
        self.proxies.push(VisualProxy { index: body_index, transform, attributes });
        Ok(slot)
    }

    pub fn get(&self, index: usize) -> Option<&VisualProxy> {
        self.proxies.get(index)
    }

    pub fn as_slice(&self) -> &[VisualProxy] {
        &self.proxies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisualProxy> {
        self.proxies.iter()
    }

    pub(in crate::rendering) fn iter_mut(&mut self) -> std::slice::IterMut<'_, VisualProxy> {
        self.proxies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Drop every proxy, returning how many were released.
    pub fn release(&mut self) -> usize {
        let released = self.proxies.len();
        self.proxies.clear();
        released
    }
}
