use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::materials::MaterialTag;

/// Collision shape attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: [f32; 3] },
    /// Infinite plane through the body position. `normal` is in body space.
    Plane { normal: [f32; 3] },
}

impl Shape {
    /// Radius of the smallest sphere around the shape, `None` for unbounded shapes.
    pub fn bounding_radius(&self) -> Option<f32> {
        match *self {
            Shape::Sphere { radius } => Some(radius),
            Shape::Box { half_extents } => Some(Vec3::from_array(half_extents).length()),
            Shape::Plane { .. } => None,
        }
    }

    /// Extent of the shape along world direction `n` when oriented by `rotation`.
    pub fn support_distance(&self, rotation: Quat, n: Vec3) -> f32 {
        match *self {
            Shape::Sphere { radius } => radius,
            Shape::Box { half_extents } => {
                let h = Vec3::from_array(half_extents);
                (rotation * Vec3::X * h.x).dot(n).abs()
                    + (rotation * Vec3::Y * h.y).dot(n).abs()
                    + (rotation * Vec3::Z * h.z).dot(n).abs()
            }
            Shape::Plane { .. } => 0.0,
        }
    }

    /// Scale applied to the unit render mesh for this shape.
    pub fn render_scale(&self) -> Vec3 {
        match *self {
            Shape::Sphere { radius } => Vec3::splat(radius),
            Shape::Box { half_extents } => Vec3::from_array(half_extents),
            Shape::Plane { .. } => Vec3::ONE,
        }
    }
}

/// Everything needed to insert a body into the world.
#[derive(Debug, Clone, Copy)]
pub struct BodySpec {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    /// Zero makes the body static.
    pub mass: f32,
    pub shape: Shape,
    pub material: MaterialTag,
}

impl BodySpec {
    pub fn dynamic(position: Vec3, mass: f32, shape: Shape, material: MaterialTag) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            mass,
            shape,
            material,
        }
    }

    pub fn fixed(position: Vec3, shape: Shape, material: MaterialTag) -> Self {
        Self::dynamic(position, 0.0, shape, material)
    }

    /// Static plane through `point` facing `normal`.
    pub fn ground_plane(point: Vec3, normal: Vec3, material: MaterialTag) -> Self {
        Self::fixed(point, Shape::Plane { normal: normal.normalize_or(Vec3::Y).to_array() }, material)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SleepState {
    pub asleep: bool,
    /// Seconds spent below the sleep velocity limits.
    pub rest_time: f32,
}

/// A simulated rigid body. Owned by [`SimulationWorld`](super::SimulationWorld).
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    pub(crate) index: usize,
    pub(crate) position: Vec3,
    pub(crate) orientation: Quat,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub(crate) shape: Shape,
    pub(crate) material: MaterialTag,
    pub(crate) sleep: SleepState,
}

impl PhysicsBody {
    pub(crate) fn from_spec(index: usize, spec: BodySpec) -> Self {
        // Planes are immovable whatever mass they were given.
        let is_plane = matches!(spec.shape, Shape::Plane { .. });
        let mass = if is_plane || !spec.mass.is_finite() { 0.0 } else { spec.mass.max(0.0) };
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        Self {
            index,
            position: spec.position,
            orientation: spec.orientation.normalize(),
            linear_velocity: if inv_mass > 0.0 { spec.linear_velocity } else { Vec3::ZERO },
            angular_velocity: Vec3::ZERO,
            mass,
            inv_mass,
            shape: spec.shape,
            material: spec.material,
            sleep: SleepState::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn material(&self) -> MaterialTag {
        self.material
    }

    pub fn sleep_state(&self) -> SleepState {
        self.sleep
    }

    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep.asleep
    }

    /// World-space normal of a plane body.
    pub(crate) fn plane_normal(&self) -> Option<Vec3> {
        match self.shape {
            Shape::Plane { normal } => Some((self.orientation * Vec3::from_array(normal)).normalize_or(Vec3::Y)),
            _ => None,
        }
    }

    pub(crate) fn wake(&mut self) {
        self.sleep = SleepState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_bodies_are_forced_static() {
        let spec = BodySpec::dynamic(
            Vec3::ZERO,
            5.0,
            Shape::Plane { normal: [0.0, 1.0, 0.0] },
            MaterialTag::Ground,
        );
        let body = PhysicsBody::from_spec(0, spec);
        assert!(body.is_static());
        assert_eq!(body.mass(), 0.0);
    }

    #[test]
    fn box_support_distance_follows_rotation() {
        let shape = Shape::Box { half_extents: [1.0, 0.5, 1.0] };
        assert!((shape.support_distance(Quat::IDENTITY, Vec3::Y) - 0.5).abs() < 1e-6);
        let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assert!((shape.support_distance(quarter, Vec3::Y) - 1.0).abs() < 1e-5);
    }
}
