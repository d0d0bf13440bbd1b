use tracing::error;

use super::proxy::{Transform, VisualProxyRegistry};
use crate::error::SceneError;
use crate::world::SimulationWorld;

/// Copies body transforms onto their proxies. The only writer of proxy transforms.
#[derive(Debug, Default)]
pub struct SyncBridge {
    synced_frames: u64,
}

impl SyncBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every body onto the proxy in the same slot.
    ///
    /// Fails without touching any proxy when the collections are out of step: skipping
    /// slots would leave rendering permanently desynchronized from physics.
    pub fn sync(&mut self, world: &SimulationWorld, proxies: &mut VisualProxyRegistry) -> Result<(), SceneError> {
        let bodies = world.bodies();
        if bodies.is_empty() {
            error!("Sync requested before any bodies exist");
            return Err(SceneError::EmptyWorld);
        }
        if bodies.len() != proxies.len() {
            error!("Body/proxy count mismatch: {} bodies, {} proxies", bodies.len(), proxies.len());
            return Err(SceneError::CountMismatch { bodies: bodies.len(), proxies: proxies.len() });
        }

        for (body, proxy) in bodies.iter().zip(proxies.iter_mut()) {
            debug_assert_eq!(body.index(), proxy.index());
            proxy.set_transform(Transform::new(body.position(), body.orientation()));
        }
        self.synced_frames += 1;
        Ok(())
    }

    pub fn synced_frames(&self) -> u64 {
        self.synced_frames
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::assets::AssetCatalog;
    use crate::config::SimulationConfig;
    use crate::world::{BodySpec, MaterialTag, ParticleBodyFactory, Shape};

    #[test]
    fn empty_world_is_an_invariant_violation() {
        let world = SimulationWorld::new(&SimulationConfig::default());
        let mut proxies = VisualProxyRegistry::new();
        assert!(matches!(SyncBridge::new().sync(&world, &mut proxies), Err(SceneError::EmptyWorld)));
    }

    #[test]
    fn unpaired_body_is_an_invariant_violation() {
        let config = SimulationConfig { particle_count: 3, seed: Some(7), ..SimulationConfig::default() };
        let mut world = SimulationWorld::new(&config);
        let mut proxies = VisualProxyRegistry::new();
        let mut factory = ParticleBodyFactory::new(&config, AssetCatalog::default());
        factory.spawn(&mut world, &mut proxies, 3, &config.spawn_bounds).unwrap();
        world.add_body(BodySpec::dynamic(Vec3::ZERO, 1.0, Shape::Sphere { radius: 0.2 }, MaterialTag::Particle));

        let before: Vec<_> = proxies.iter().map(|p| p.position()).collect();
        let err = SyncBridge::new().sync(&world, &mut proxies).unwrap_err();
        assert!(matches!(err, SceneError::CountMismatch { bodies: 4, proxies: 3 }));
        let after: Vec<_> = proxies.iter().map(|p| p.position()).collect();
        assert_eq!(before, after);
    }
}
