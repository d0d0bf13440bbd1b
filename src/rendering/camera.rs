use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::config::CameraPathSettings;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            aspect,
            fovy: 45.0,
            znear: 0.1,
            zfar: 200.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy.to_radians(), self.aspect, self.znear, self.zfar)
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space orientation of the camera, looking down its local -Z.
    pub fn orientation(&self) -> Quat {
        Quat::from_mat4(&self.view_matrix().inverse())
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or(Vec3::NEG_Z)
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.build_view_projection_matrix().to_cols_array_2d(),
            eye: self.eye.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

/// Closed polyline of waypoints traversed at a fixed time per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPath {
    waypoints: Vec<Vec3>,
    segment_duration: f64,
    target: Vec3,
}

impl CameraPath {
    pub fn new(waypoints: Vec<Vec3>, segment_duration: f64, target: Vec3) -> Result<Self, ConfigError> {
        if waypoints.is_empty() {
            return Err(ConfigError::EmptyCameraPath);
        }
        if !segment_duration.is_finite() || segment_duration <= 0.0 {
            return Err(ConfigError::InvalidSegmentDuration(segment_duration));
        }
        Ok(Self { waypoints, segment_duration, target })
    }

    pub fn from_settings(settings: &CameraPathSettings) -> Result<Self, ConfigError> {
        Self::new(
            settings.waypoints.iter().copied().map(Vec3::from_array).collect(),
            settings.segment_duration,
            Vec3::from_array(settings.look_at),
        )
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Seconds for one full loop.
    pub fn period(&self) -> f64 {
        self.segment_duration * self.waypoints.len() as f64
    }

    /// Active segment and local parameter at `elapsed` seconds into the path.
    pub fn segment_at(&self, elapsed: f64) -> (usize, usize, f64) {
        let n = self.waypoints.len();
        let d = self.segment_duration;
        let segments = (elapsed / d).floor();
        let i = (segments.rem_euclid(n as f64)) as usize % n;
        let j = (i + 1) % n;
        let t = (elapsed.rem_euclid(d) / d).clamp(0.0, 1.0);
        // rem_euclid can round up to d for tiny negative inputs
        let t = if t >= 1.0 { 0.0 } else { t };
        (i, j, t)
    }

    pub fn position_at(&self, elapsed: f64) -> Vec3 {
        let (i, j, t) = self.segment_at(elapsed);
        self.waypoints[i].lerp(self.waypoints[j], t as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Origin {
    At(f64),
    /// Set by `reset`; the next update becomes time zero.
    Pending,
}

/// Moves the camera along a [`CameraPath`] as a function of elapsed time.
/// The camera is re-aimed at the path target on every update; rotations are never
/// interpolated on their own.
#[derive(Debug, Clone)]
pub struct CameraPathController {
    path: CameraPath,
    origin: Origin,
    camera: Camera,
}

impl CameraPathController {
    pub fn new(path: CameraPath, aspect: f32) -> Self {
        let eye = path.waypoints[0];
        let camera = Camera::new(eye, path.target, aspect);
        Self { path, origin: Origin::At(0.0), camera }
    }

    /// Position the camera for wall-clock `elapsed` seconds.
    pub fn update(&mut self, elapsed: f64) -> &Camera {
        let origin = match self.origin {
            Origin::At(origin) => origin,
            Origin::Pending => {
                self.origin = Origin::At(elapsed);
                elapsed
            }
        };
        let eye = self.path.position_at(elapsed - origin);
        // Degenerate look-at (eye on the target): keep the previous eye.
        if eye.distance_squared(self.path.target) > f32::EPSILON {
            self.camera.eye = eye;
        }
        self.camera.target = self.path.target;
        &self.camera
    }

    /// Re-zero the time origin without touching the waypoints.
    pub fn reset(&mut self) {
        self.origin = Origin::Pending;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.camera.aspect = aspect;
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn path(&self) -> &CameraPath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> CameraPath {
        CameraPath::new(
            vec![Vec3::new(10.0, 5.0, 0.0), Vec3::new(0.0, 5.0, 10.0), Vec3::new(-10.0, 8.0, 0.0)],
            2.0,
            Vec3::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn midpoint_interpolates_linearly() {
        let path = triangle();
        assert_eq!(path.position_at(1.0), Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn segment_index_wraps() {
        let path = triangle();
        assert_eq!(path.segment_at(4.5), (2, 0, 0.25));
        assert_eq!(path.segment_at(6.0), (0, 1, 0.0));
    }

    #[test]
    fn single_waypoint_is_stationary() {
        let path = CameraPath::new(vec![Vec3::new(1.0, 2.0, 3.0)], 5.0, Vec3::ZERO).unwrap();
        assert_eq!(path.position_at(7.3), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        assert!(matches!(CameraPath::new(Vec::new(), 1.0, Vec3::ZERO), Err(ConfigError::EmptyCameraPath)));
        assert!(matches!(
            CameraPath::new(vec![Vec3::ONE], 0.0, Vec3::ZERO),
            Err(ConfigError::InvalidSegmentDuration(_))
        ));
    }

    #[test]
    fn camera_always_faces_the_target() {
        let mut controller = CameraPathController::new(triangle(), 1.5);
        for step in 0..50 {
            let camera = *controller.update(step as f64 * 0.13);
            let expected = (Vec3::ZERO - camera.eye).normalize();
            let facing = camera.orientation() * Vec3::NEG_Z;
            assert!(facing.distance(expected) < 1e-4);
        }
    }

    #[test]
    fn reset_rebases_time() {
        let mut controller = CameraPathController::new(triangle(), 1.0);
        controller.update(3.0);
        controller.reset();
        assert_eq!(controller.update(17.25).eye, triangle().waypoints()[0]);
        assert_eq!(controller.update(18.25).eye, triangle().position_at(1.0));
        assert_eq!(controller.path().waypoints(), triangle().waypoints());
    }
}
