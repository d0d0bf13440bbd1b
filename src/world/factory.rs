use std::ops::Range;

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::body::{BodySpec, Shape};
use super::physics::SimulationWorld;
use crate::assets::{AssetCatalog, GeometryKind};
use crate::config::{GroundSettings, ParticleClass, SimulationConfig, SpawnBounds};
use crate::error::SceneError;
use crate::rendering::proxy::{RenderAttributes, Transform, VisualProxyRegistry};

/// Creates bodies together with their visual proxies so the two stay index-aligned.
pub struct ParticleBodyFactory {
    class: ParticleClass,
    catalog: AssetCatalog,
    rng: StdRng,
    spawned: usize,
}

impl ParticleBodyFactory {
    pub fn new(config: &SimulationConfig, catalog: AssetCatalog) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { class: config.particle_class, catalog, rng, spawned: 0 }
    }

    pub fn class(&self) -> ParticleClass {
        self.class
    }

    /// Particles created so far, ground excluded.
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Spawn `count` particles uniformly inside `bounds`. Returns the new body indices.
    pub fn spawn(
        &mut self,
        world: &mut SimulationWorld,
        proxies: &mut VisualProxyRegistry,
        count: usize,
        bounds: &SpawnBounds,
    ) -> Result<Range<usize>, SceneError> {
        bounds.validate()?;
        let start = world.len();
        if count == 0 {
            return Ok(start..start);
        }
        let (min, max) = (bounds.min(), bounds.max());
        for _ in 0..count {
            let position = Vec3::new(
                self.rng.random_range(min.x..=max.x),
                self.rng.random_range(min.y..=max.y),
                self.rng.random_range(min.z..=max.z),
            );
            self.spawn_at(world, proxies, position)?;
        }
        debug!("Spawned {} {:?} particles", count, self.class);
        Ok(start..world.len())
    }

    /// Spawn a single particle of the configured class at `position`.
    pub fn spawn_at(
        &mut self,
        world: &mut SimulationWorld,
        proxies: &mut VisualProxyRegistry,
        position: Vec3,
    ) -> Result<usize, SceneError> {
        let shape = self.class.shape();
        let orientation = match shape {
            Shape::Box { .. } => Quat::from_rotation_y(self.rng.random_range(0.0..std::f32::consts::TAU)),
            _ => Quat::IDENTITY,
        };
        let spec = BodySpec {
            orientation,
            ..BodySpec::dynamic(position, self.class.mass(), shape, self.class.material())
        };
        let (material, color) = self.catalog.material_for(self.spawned);
        let attributes = RenderAttributes {
            geometry: self.catalog.geometry_for(&shape),
            material,
            color,
            scale: shape.render_scale(),
        };
        let index = insert_pair(world, proxies, spec, attributes)?;
        self.spawned += 1;
        Ok(index)
    }

    /// Static ground plane with its proxy.
    pub fn add_ground(
        &mut self,
        world: &mut SimulationWorld,
        proxies: &mut VisualProxyRegistry,
        ground: &GroundSettings,
    ) -> Result<usize, SceneError> {
        let spec = BodySpec::ground_plane(Vec3::new(0.0, ground.height, 0.0), Vec3::Y, ground.material);
        let (material, color) = self.catalog.ground_material();
        let attributes = RenderAttributes {
            geometry: GeometryKind::Plane.handle(),
            material,
            color,
            scale: Vec3::new(50.0, 1.0, 50.0),
        };
        let index = insert_pair(world, proxies, spec, attributes)?;
        info!("Ground plane added at y = {}", ground.height);
        Ok(index)
    }
}

fn insert_pair(
    world: &mut SimulationWorld,
    proxies: &mut VisualProxyRegistry,
    spec: BodySpec,
    attributes: RenderAttributes,
) -> Result<usize, SceneError> {
    if world.len() != proxies.len() {
        return Err(SceneError::CountMismatch { bodies: world.len(), proxies: proxies.len() });
    }
    let index = world.add_body(spec);
    let body = &world.bodies()[index];
    proxies.insert(index, Transform::new(body.position(), body.orientation()), attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn setup(seed: u64) -> (SimulationConfig, SimulationWorld, VisualProxyRegistry, ParticleBodyFactory) {
        let config = SimulationConfig { seed: Some(seed), ..SimulationConfig::default() };
        let world = SimulationWorld::new(&config);
        let factory = ParticleBodyFactory::new(&config, AssetCatalog::default());
        (config, world, VisualProxyRegistry::new(), factory)
    }

    #[test]
    fn spawn_pairs_every_body_with_a_proxy() {
        let (config, mut world, mut proxies, mut factory) = setup(1);
        let range = factory.spawn(&mut world, &mut proxies, 25, &config.spawn_bounds).unwrap();
        assert_eq!(range, 0..25);
        assert_eq!(world.len(), 25);
        assert_eq!(proxies.len(), 25);
        for (body, proxy) in world.bodies().iter().zip(proxies.iter()) {
            assert_eq!(body.index(), proxy.index());
            assert_eq!(body.position(), proxy.position());
            assert!(config.spawn_bounds.contains(body.position()));
            assert_eq!(body.mass(), ParticleClass::Pebble.mass());
        }
    }

    #[test]
    fn zero_count_is_a_no_op() {
        let (config, mut world, mut proxies, mut factory) = setup(2);
        let range = factory.spawn(&mut world, &mut proxies, 0, &config.spawn_bounds).unwrap();
        assert!(range.is_empty());
        assert!(world.is_empty() && proxies.is_empty());
    }

    #[test]
    fn seeded_factories_are_reproducible() {
        let (config, mut world_a, mut proxies_a, mut factory_a) = setup(42);
        let (_, mut world_b, mut proxies_b, mut factory_b) = setup(42);
        factory_a.spawn(&mut world_a, &mut proxies_a, 10, &config.spawn_bounds).unwrap();
        factory_b.spawn(&mut world_b, &mut proxies_b, 10, &config.spawn_bounds).unwrap();
        let a: Vec<_> = world_a.bodies().iter().map(|b| b.position()).collect();
        let b: Vec<_> = world_b.bodies().iter().map(|b| b.position()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_bounds_pin_the_spawn_point() {
        let (_, mut world, mut proxies, mut factory) = setup(3);
        let point = Vec3::new(1.0, 12.0, -2.0);
        let bounds = SpawnBounds::new(point, point);
        factory.spawn(&mut world, &mut proxies, 3, &bounds).unwrap();
        assert!(world.bodies().iter().all(|b| b.position() == point));
    }

    #[test]
    fn inverted_bounds_are_rejected_without_spawning() {
        let (_, mut world, mut proxies, mut factory) = setup(4);
        let bounds = SpawnBounds::new(Vec3::ONE, Vec3::ZERO);
        let result = factory.spawn(&mut world, &mut proxies, 1, &bounds);
        assert!(matches!(result, Err(SceneError::Config(ConfigError::InvalidSpawnBounds { axis: 'x' }))));
        assert!(world.is_empty() && proxies.is_empty());
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let (_, mut world, mut proxies, mut factory) = setup(5);
        let bounds = SpawnBounds::new(Vec3::ZERO, Vec3::new(1.0, f32::NAN, 1.0));
        let result = factory.spawn(&mut world, &mut proxies, 3, &bounds);
        assert!(matches!(result, Err(SceneError::Config(ConfigError::InvalidSpawnBounds { axis: 'y' }))));
        assert!(world.is_empty());
    }
}
