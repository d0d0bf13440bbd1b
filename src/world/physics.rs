use glam::{Quat, Vec3};
use tracing::{debug, info};

use super::body::{BodySpec, PhysicsBody};
use super::broad_phase::{BroadPhase, Proxy};
use crate::config::{SimulationConfig, SleepSettings};
use crate::world::MaterialTable;

/// Penetration a sleeping body may keep without being woken.
const SLEEPER_CONTACT_SLOP: f32 = 1e-3;

/// Tunables pulled out of [`SimulationConfig`] when the world is built.
#[derive(Debug, Clone)]
struct WorldParams {
    gravity: Vec3,
    linear_damping: f32,
    angular_damping: f32,
    restitution_threshold: f32,
    sleep: SleepSettings,
    materials: MaterialTable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub integrated: u32,
    pub plane_contacts: u32,
    pub pairs_tested: u32,
    pub body_contacts: u32,
    pub fell_asleep: u32,
}

/// Rigid-body scene advanced in fixed increments.
///
/// Bodies are append-only for the lifetime of a session: the index returned by
/// [`add_body`](Self::add_body) stays valid until [`clear`](Self::clear).
pub struct SimulationWorld {
    bodies: Vec<PhysicsBody>,
    params: WorldParams,
    gravity_enabled: bool,
    broad_phase: BroadPhase,
    planes: Vec<usize>,
    scratch: Vec<Proxy>,
    steps: u64,
}

impl SimulationWorld {
    pub fn new(config: &SimulationConfig) -> Self {
        info!(
            "Creating simulation world: gravity {:?}, broad phase {:?}",
            config.gravity, config.broad_phase
        );
        Self {
            bodies: Vec::with_capacity(config.particle_count + 1),
            params: WorldParams {
                gravity: config.gravity(),
                linear_damping: config.linear_damping.max(0.0),
                angular_damping: config.angular_damping.max(0.0),
                restitution_threshold: config.restitution_threshold.max(0.0),
                sleep: config.sleep,
                materials: config.materials.clone(),
            },
            gravity_enabled: true,
            broad_phase: BroadPhase::new(config.broad_phase),
            planes: Vec::new(),
            scratch: Vec::new(),
            steps: 0,
        }
    }

    /// Insert a body and return its stable index.
    pub fn add_body(&mut self, spec: BodySpec) -> usize {
        let index = self.bodies.len();
        let body = PhysicsBody::from_spec(index, spec);
        if body.plane_normal().is_some() {
            self.planes.push(index);
        }
        debug!("Added body {} ({:?}, mass {})", index, body.shape, body.mass);
        self.bodies.push(body);
        index
    }

    pub fn body(&self, index: usize) -> Option<&PhysicsBody> {
        self.bodies.get(index)
    }

    pub fn bodies(&self) -> &[PhysicsBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn awake_count(&self) -> usize {
        self.bodies.iter().filter(|b| !b.is_static() && !b.is_asleep()).count()
    }

    /// Gravity currently applied, zero while gravity is toggled off.
    pub fn gravity(&self) -> Vec3 {
        if self.gravity_enabled { self.params.gravity } else { Vec3::ZERO }
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        if self.gravity_enabled != enabled {
            self.gravity_enabled = enabled;
            // Resting bodies must react to the new field.
            self.wake_all();
        }
    }

    pub fn wake_all(&mut self) {
        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            body.wake();
        }
    }

    /// Drop every body. Only used by scene teardown.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.planes.clear();
        self.scratch.clear();
    }

    /// Advance every awake dynamic body by exactly `dt` seconds.
    pub fn step(&mut self, dt: f32) -> StepStats {
        let mut stats = StepStats::default();
        if !(dt > 0.0) {
            return stats;
        }
        self.steps += 1;

        self.integrate(dt, &mut stats);
        self.resolve_plane_contacts(&mut stats);
        self.resolve_body_contacts(&mut stats);
        if self.params.sleep.enabled {
            self.update_sleep(dt, &mut stats);
        }
        stats
    }

    fn integrate(&mut self, dt: f32, stats: &mut StepStats) {
        let gravity = self.gravity();
        let linear_keep = 1.0 / (1.0 + dt * self.params.linear_damping);
        let angular_keep = 1.0 / (1.0 + dt * self.params.angular_damping);

        for body in self.bodies.iter_mut() {
            if body.is_static() || body.is_asleep() {
                continue;
            }
            // Semi-implicit Euler: velocity first, then position with the new velocity.
            body.linear_velocity = (body.linear_velocity + gravity * dt) * linear_keep;
            body.angular_velocity *= angular_keep;
            body.position += body.linear_velocity * dt;

            let w = body.angular_velocity;
            if w.length_squared() > 0.0 {
                let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.orientation;
                body.orientation = (body.orientation + spin * (0.5 * dt)).normalize();
            }
            stats.integrated += 1;
        }
    }

    fn resolve_plane_contacts(&mut self, stats: &mut StepStats) {
        let threshold = self.params.restitution_threshold;
        for &plane_index in &self.planes {
            let plane = &self.bodies[plane_index];
            let (Some(normal), origin, plane_material) = (plane.plane_normal(), plane.position, plane.material) else {
                continue;
            };

            for body in self.bodies.iter_mut() {
                if body.is_static() || body.is_asleep() {
                    continue;
                }
                let reach = body.shape.support_distance(body.orientation, normal);
                let depth = reach - (body.position - origin).dot(normal);
                if depth <= 0.0 {
                    continue;
                }
                stats.plane_contacts += 1;
                body.position += normal * depth;

                let props = self.params.materials.lookup(body.material, plane_material);
                let vn = body.linear_velocity.dot(normal);
                if vn >= 0.0 {
                    continue;
                }
                let bounce = if -vn > threshold { props.restitution } else { 0.0 };
                let normal_change = -(1.0 + bounce) * vn;
                body.linear_velocity += normal * normal_change;

                // Coulomb friction bounded by the normal impulse.
                let tangent_velocity = body.linear_velocity - normal * body.linear_velocity.dot(normal);
                let slip = tangent_velocity.length();
                if slip > 0.0 {
                    let reduction = (props.friction * normal_change).min(slip);
                    body.linear_velocity -= tangent_velocity * (reduction / slip);
                }

                if let super::Shape::Sphere { radius } = body.shape {
                    // Rolling without slipping on the plane.
                    let rolling = body.linear_velocity - normal * body.linear_velocity.dot(normal);
                    body.angular_velocity = normal.cross(rolling) / radius;
                }
            }
        }
    }

    fn resolve_body_contacts(&mut self, stats: &mut StepStats) {
        self.scratch.clear();
        self.scratch.extend(self.bodies.iter().filter_map(|b| {
            b.shape.bounding_radius().map(|radius| Proxy { index: b.index, center: b.position, radius })
        }));
        let threshold = self.params.restitution_threshold;
        let pairs = self.broad_phase.find_pairs(&self.scratch);
        stats.pairs_tested += pairs.len() as u32;

        for &(i, j) in pairs {
            let (left, right) = self.bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            let inv_sum = a.inv_mass + b.inv_mass;
            if inv_sum == 0.0 || (a.is_asleep() && b.is_asleep()) {
                continue;
            }
            let (Some(ra), Some(rb)) = (a.shape.bounding_radius(), b.shape.bounding_radius()) else {
                continue;
            };
            let delta = b.position - a.position;
            let distance = delta.length();
            let depth = ra + rb - distance;
            if depth <= 0.0 {
                continue;
            }
            // A sleeper already resting against its partner stays asleep.
            if (a.is_asleep() || b.is_asleep()) && depth <= SLEEPER_CONTACT_SLOP {
                continue;
            }
            stats.body_contacts += 1;

            // Any sleeper about to be pushed out of an overlap wakes up.
            if a.is_asleep() {
                a.wake();
            }
            if b.is_asleep() {
                b.wake();
            }

            let normal = if distance > 1e-6 { delta / distance } else { Vec3::Y };
            a.position -= normal * (depth * a.inv_mass / inv_sum);
            b.position += normal * (depth * b.inv_mass / inv_sum);

            let relative = b.linear_velocity - a.linear_velocity;
            let vn = relative.dot(normal);
            if vn >= 0.0 {
                continue;
            }
            let props = self.params.materials.lookup(a.material, b.material);
            let bounce = if -vn > threshold { props.restitution } else { 0.0 };
            let impulse = -(1.0 + bounce) * vn / inv_sum;
            a.linear_velocity -= normal * (impulse * a.inv_mass);
            b.linear_velocity += normal * (impulse * b.inv_mass);

            let tangent = relative - normal * vn;
            let slip = tangent.length();
            if slip > 1e-6 {
                let friction_impulse = (props.friction * impulse).min(slip / inv_sum);
                let dir = tangent / slip;
                a.linear_velocity += dir * (friction_impulse * a.inv_mass);
                b.linear_velocity -= dir * (friction_impulse * b.inv_mass);
            }
        }
    }

    fn update_sleep(&mut self, dt: f32, stats: &mut StepStats) {
        let sleep = self.params.sleep;
        let linear_limit = sleep.linear_speed_limit * sleep.linear_speed_limit;
        let angular_limit = sleep.angular_speed_limit * sleep.angular_speed_limit;

        for body in self.bodies.iter_mut() {
            if body.is_static() || body.is_asleep() {
                continue;
            }
            let resting = body.linear_velocity.length_squared() <= linear_limit
                && body.angular_velocity.length_squared() <= angular_limit;
            if !resting {
                body.sleep.rest_time = 0.0;
                continue;
            }
            body.sleep.rest_time += dt;
            if body.sleep.rest_time >= sleep.time_to_sleep {
                body.sleep.asleep = true;
                body.linear_velocity = Vec3::ZERO;
                body.angular_velocity = Vec3::ZERO;
                stats.fell_asleep += 1;
            }
        }
    }
}

impl std::fmt::Debug for SimulationWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationWorld")
            .field("bodies", &self.bodies.len())
            .field("planes", &self.planes.len())
            .field("gravity", &self.gravity())
            .field("steps", &self.steps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MaterialTag, Shape};

    fn world() -> SimulationWorld {
        let config = SimulationConfig { linear_damping: 0.0, ..SimulationConfig::default() };
        SimulationWorld::new(&config)
    }

    #[test]
    fn free_fall_matches_semi_implicit_euler() {
        let mut world = world();
        let dt = 1.0 / 60.0;
        let id = world.add_body(BodySpec::dynamic(
            Vec3::new(0.0, 10.0, 0.0),
            1.0,
            Shape::Sphere { radius: 0.5 },
            MaterialTag::Particle,
        ));
        world.step(dt);
        let body = world.body(id).unwrap();
        let v = -9.81 * dt;
        assert!((body.linear_velocity().y - v).abs() < 1e-6);
        assert!((body.position().y - (10.0 + v * dt)).abs() < 1e-6);
    }

    #[test]
    fn zero_dt_is_ignored() {
        let mut world = world();
        world.add_body(BodySpec::dynamic(Vec3::Y, 1.0, Shape::Sphere { radius: 0.5 }, MaterialTag::Particle));
        assert_eq!(world.step(0.0), StepStats::default());
        assert_eq!(world.step_count(), 0);
    }

    #[test]
    fn gravity_toggle_wakes_sleepers() {
        let mut world = world();
        world.add_body(BodySpec::ground_plane(Vec3::ZERO, Vec3::Y, MaterialTag::Ground));
        let id = world.add_body(BodySpec::dynamic(
            Vec3::new(0.0, 0.5, 0.0),
            1.0,
            Shape::Sphere { radius: 0.5 },
            MaterialTag::Particle,
        ));
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }
        assert!(world.body(id).unwrap().is_asleep());
        world.set_gravity_enabled(false);
        assert!(!world.body(id).unwrap().is_asleep());
        assert_eq!(world.gravity(), Vec3::ZERO);
    }

    #[test]
    fn overlapping_spheres_are_pushed_apart() {
        let mut world = world();
        world.set_gravity_enabled(false);
        let a = world.add_body(BodySpec::dynamic(Vec3::ZERO, 1.0, Shape::Sphere { radius: 0.5 }, MaterialTag::Particle));
        let b = world.add_body(BodySpec::dynamic(
            Vec3::new(0.6, 0.0, 0.0),
            1.0,
            Shape::Sphere { radius: 0.5 },
            MaterialTag::Particle,
        ));
        world.step(1.0 / 60.0);
        let gap = world.body(b).unwrap().position().distance(world.body(a).unwrap().position());
        assert!(gap >= 1.0 - 1e-5);
    }

    #[test]
    fn sleeper_pushed_out_of_a_static_body_wakes() {
        let mut world = world();
        world.add_body(BodySpec::fixed(Vec3::ZERO, Shape::Sphere { radius: 1.0 }, MaterialTag::Stone));
        let id = world.add_body(BodySpec::dynamic(
            Vec3::new(0.0, 1.5, 0.0),
            1.0,
            Shape::Sphere { radius: 1.0 },
            MaterialTag::Particle,
        ));
        world.bodies[id].sleep.asleep = true;

        let stats = world.step(1.0 / 60.0);
        let body = world.body(id).unwrap();
        assert_eq!(stats.body_contacts, 1);
        assert!(!body.is_asleep());
        assert!(body.position().y >= 2.0 - 1e-5);
    }

    #[test]
    fn sleeper_resting_on_a_static_body_stays_asleep() {
        let mut world = world();
        world.add_body(BodySpec::fixed(Vec3::ZERO, Shape::Sphere { radius: 1.0 }, MaterialTag::Stone));
        let id = world.add_body(BodySpec::dynamic(
            Vec3::new(0.0, 2.0 - SLEEPER_CONTACT_SLOP / 2.0, 0.0),
            1.0,
            Shape::Sphere { radius: 1.0 },
            MaterialTag::Particle,
        ));
        world.bodies[id].sleep.asleep = true;
        let resting = world.body(id).unwrap().position();

        world.step(1.0 / 60.0);
        let body = world.body(id).unwrap();
        assert!(body.is_asleep());
        assert_eq!(body.position(), resting);
    }
}
