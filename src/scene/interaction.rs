use glam::{Vec2, Vec3};
use tracing::debug;

use crate::rendering::{Camera, VisualProxyRegistry};
use crate::utils::math::{ray_plane, ray_sphere, Ray};
use crate::world::{InputEvent, SceneKey, SimulationWorld, SpawnRequest};

/// Net result of the input drained at the start of a frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputEffects {
    pub spawns: Vec<SpawnRequest>,
    pub toggle_gravity: bool,
    pub reset_camera: bool,
}

/// Turns queued pointer and key input into scene actions.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    pointer: Option<Vec2>,
    hovered: Option<usize>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Fold `events` into effects. Clicks resolve against the ground under the cursor
    /// and drop a particle from `drop_height`.
    pub fn interpret(
        &mut self,
        events: Vec<InputEvent>,
        camera: &Camera,
        viewport: Vec2,
        ground_height: f32,
        drop_height: f32,
        burst: usize,
    ) -> InputEffects {
        let mut effects = InputEffects::default();
        for event in events {
            match event {
                InputEvent::PointerMove { x, y } => self.pointer = Some(Vec2::new(x, y)),
                InputEvent::PointerClick { x, y } => {
                    let pixel = Vec2::new(x, y);
                    self.pointer = Some(pixel);
                    match ground_point(camera, pixel, viewport, ground_height) {
                        Some(hit) => effects.spawns.push(SpawnRequest::At(Vec3::new(hit.x, drop_height, hit.z))),
                        None => debug!("Click at ({}, {}) missed the ground", x, y),
                    }
                }
                InputEvent::KeyPress(SceneKey::ToggleGravity) => effects.toggle_gravity = !effects.toggle_gravity,
                InputEvent::KeyPress(SceneKey::ResetCamera) => effects.reset_camera = true,
                InputEvent::KeyPress(SceneKey::ForceSpawn) => {
                    effects.spawns.extend(std::iter::repeat(SpawnRequest::Random).take(burst));
                }
                InputEvent::Spawn(request) => effects.spawns.push(request),
            }
        }
        effects
    }

    /// Re-pick the body under the last known pointer position.
    pub fn update_hover(
        &mut self,
        camera: &Camera,
        viewport: Vec2,
        world: &SimulationWorld,
        proxies: &VisualProxyRegistry,
    ) -> Option<usize> {
        self.hovered = self
            .pointer
            .and_then(|pixel| Ray::from_screen(pixel, viewport, camera.build_view_projection_matrix()))
            .and_then(|ray| pick(&ray, world, proxies));
        self.hovered
    }
}

fn ground_point(camera: &Camera, pixel: Vec2, viewport: Vec2, ground_height: f32) -> Option<Vec3> {
    let ray = Ray::from_screen(pixel, viewport, camera.build_view_projection_matrix())?;
    let t = ray_plane(&ray, Vec3::new(0.0, ground_height, 0.0), Vec3::Y)?;
    Some(ray.at(t))
}

/// Nearest dynamic body whose bounding sphere the ray hits, by proxy position.
fn pick(ray: &Ray, world: &SimulationWorld, proxies: &VisualProxyRegistry) -> Option<usize> {
    world
        .bodies()
        .iter()
        .zip(proxies.iter())
        .filter(|(body, _)| !body.is_static())
        .filter_map(|(body, proxy)| {
            let radius = body.shape().bounding_radius()?;
            ray_sphere(ray, proxy.position(), radius).map(|t| (proxy.index(), t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCatalog;
    use crate::config::SimulationConfig;
    use crate::world::ParticleBodyFactory;

    fn overhead_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 20.0, 0.01), Vec3::ZERO, 1.0)
    }

    #[test]
    fn click_spawns_above_ground_point_under_cursor() {
        let mut interaction = Interaction::new();
        let effects = interaction.interpret(
            vec![InputEvent::PointerClick { x: 50.0, y: 50.0 }],
            &overhead_camera(),
            Vec2::new(100.0, 100.0),
            0.0,
            10.0,
            5,
        );
        let [SpawnRequest::At(p)] = effects.spawns.as_slice() else {
            panic!("expected one targeted spawn, got {:?}", effects.spawns);
        };
        assert!(p.x.abs() < 0.05 && p.z.abs() < 0.05);
        assert_eq!(p.y, 10.0);
    }

    #[test]
    fn double_gravity_toggle_cancels_out() {
        let mut interaction = Interaction::new();
        let events = vec![
            InputEvent::KeyPress(SceneKey::ToggleGravity),
            InputEvent::KeyPress(SceneKey::ToggleGravity),
            InputEvent::KeyPress(SceneKey::ForceSpawn),
        ];
        let effects = interaction.interpret(events, &overhead_camera(), Vec2::new(100.0, 100.0), 0.0, 10.0, 3);
        assert!(!effects.toggle_gravity);
        assert_eq!(effects.spawns, vec![SpawnRequest::Random; 3]);
    }

    #[test]
    fn hover_picks_body_under_pointer() {
        let config = SimulationConfig { seed: Some(5), ..SimulationConfig::default() };
        let mut world = SimulationWorld::new(&config);
        let mut proxies = VisualProxyRegistry::new();
        let mut factory = ParticleBodyFactory::new(&config, AssetCatalog::default());
        factory.spawn_at(&mut world, &mut proxies, Vec3::new(8.0, 2.0, 8.0)).unwrap();
        let target = factory.spawn_at(&mut world, &mut proxies, Vec3::new(0.0, 2.0, 0.0)).unwrap();

        let mut interaction = Interaction::new();
        let camera = overhead_camera();
        let viewport = Vec2::new(100.0, 100.0);
        interaction.interpret(vec![InputEvent::PointerMove { x: 50.0, y: 50.0 }], &camera, viewport, 0.0, 10.0, 1);
        assert_eq!(interaction.update_hover(&camera, viewport, &world, &proxies), Some(target));

        interaction.interpret(vec![InputEvent::PointerMove { x: 0.0, y: 0.0 }], &camera, viewport, 0.0, 10.0, 1);
        assert_eq!(interaction.update_hover(&camera, viewport, &world, &proxies), None);
    }
}
