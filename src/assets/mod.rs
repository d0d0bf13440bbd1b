pub mod mesh;
pub mod texture;

use tracing::warn;

use crate::world::Shape;

/// Opaque reference to one of the unit meshes a renderer provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub(crate) u32);

/// Opaque reference to a palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Sphere,
    Cube,
    Plane,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 3] = [GeometryKind::Sphere, GeometryKind::Cube, GeometryKind::Plane];

    pub fn handle(self) -> GeometryHandle {
        GeometryHandle(self as u32)
    }

    pub fn from_handle(handle: GeometryHandle) -> Option<Self> {
        Self::ALL.get(handle.0 as usize).copied()
    }

    pub fn for_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Sphere { .. } => GeometryKind::Sphere,
            Shape::Box { .. } => GeometryKind::Cube,
            Shape::Plane { .. } => GeometryKind::Plane,
        }
    }
}

pub const FALLBACK_COLOR: [f32; 4] = [0.8, 0.2, 0.8, 1.0];

/// Visual assets handed to the scene by its host. Contents are never inspected beyond
/// picking a handle and colour for each new proxy.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    palette: Vec<[f32; 4]>,
    ground_color: [f32; 4],
}

impl AssetCatalog {
    pub fn new(palette: Vec<[f32; 4]>, ground_color: [f32; 4]) -> Self {
        if palette.is_empty() {
            warn!("Asset palette is empty, particles will use the fallback color");
        }
        Self { palette, ground_color }
    }

    pub fn geometry_for(&self, shape: &Shape) -> GeometryHandle {
        GeometryKind::for_shape(shape).handle()
    }

    /// Material for the `n`th spawned particle, cycling through the palette.
    pub fn material_for(&self, n: usize) -> (MaterialHandle, [f32; 4]) {
        if self.palette.is_empty() {
            return (MaterialHandle(u32::MAX), FALLBACK_COLOR);
        }
        let slot = n % self.palette.len();
        (MaterialHandle(slot as u32), self.palette[slot])
    }

    pub fn ground_material(&self) -> (MaterialHandle, [f32; 4]) {
        (MaterialHandle(u32::MAX - 1), self.ground_color)
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new(crate::config::RenderSettings::default().palette, [0.25, 0.27, 0.3, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        let catalog = AssetCatalog::new(vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]], [0.0; 4]);
        assert_eq!(catalog.material_for(0), catalog.material_for(2));
        assert_ne!(catalog.material_for(0).1, catalog.material_for(1).1);
    }

    #[test]
    fn empty_palette_uses_fallback() {
        let catalog = AssetCatalog::new(Vec::new(), [0.0; 4]);
        assert_eq!(catalog.material_for(7).1, FALLBACK_COLOR);
    }

    #[test]
    fn geometry_handles_round_trip() {
        for kind in GeometryKind::ALL {
            assert_eq!(GeometryKind::from_handle(kind.handle()), Some(kind));
        }
    }
}
