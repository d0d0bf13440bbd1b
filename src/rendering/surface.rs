use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use tracing::debug;

use super::camera::Camera;
use super::proxy::VisualProxy;
use super::shader_time::TimeUniform;
use crate::error::RenderError;

/// Everything a renderer needs for one frame. Borrowed from the scene for the duration
/// of the render call.
#[derive(Debug)]
pub struct RenderFrame<'a> {
    pub frame_index: u64,
    pub proxies: &'a [VisualProxy],
    pub camera: &'a Camera,
    pub surface_time: TimeUniform,
    pub backdrop_time: TimeUniform,
    pub hovered: Option<usize>,
}

/// Attach point a scene renders into.
pub trait RenderSurface {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    /// Free geometries, materials and the surface binding. Called once, last, on teardown.
    fn release(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub positions: Vec<Vec3>,
    pub eye: Vec3,
    pub shader_time: f32,
    pub hovered: Option<usize>,
}

#[derive(Debug, Default)]
pub struct HeadlessLog {
    pub frames: Vec<FrameRecord>,
    pub releases: u32,
    pub resizes: Vec<(u32, u32)>,
    pub failed_renders: u32,
}

/// Shared view into what a [`HeadlessSurface`] received, usable after the scene
/// has taken ownership of the surface.
#[derive(Debug, Clone, Default)]
pub struct HeadlessProbe(Rc<RefCell<HeadlessLog>>);

impl HeadlessProbe {
    pub fn frame_count(&self) -> usize {
        self.0.borrow().frames.len()
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.0.borrow().frames.last().cloned()
    }

    pub fn releases(&self) -> u32 {
        self.0.borrow().releases
    }

    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.0.borrow().resizes.clone()
    }

    pub fn failed_renders(&self) -> u32 {
        self.0.borrow().failed_renders
    }
}

/// Render surface that records frames instead of drawing them.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    log: HeadlessProbe,
    fail_renders: bool,
    released: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose every render fails, as a lost GPU surface would.
    pub fn failing() -> Self {
        Self { fail_renders: true, ..Self::default() }
    }

    pub fn probe(&self) -> HeadlessProbe {
        self.log.clone()
    }
}

impl RenderSurface for HeadlessSurface {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        let mut log = self.log.0.borrow_mut();
        if self.released {
            return Err(RenderError::Released);
        }
        if self.fail_renders {
            log.failed_renders += 1;
            return Err(RenderError::SurfaceUnavailable("headless surface configured to fail".into()));
        }
        log.frames.push(FrameRecord {
            frame_index: frame.frame_index,
            positions: frame.proxies.iter().map(|p| p.position()).collect(),
            eye: frame.camera.eye,
            shader_time: frame.surface_time.time,
            hovered: frame.hovered,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.0.borrow_mut().resizes.push((width, height));
    }

    // Counts every call so tests can catch a scene releasing twice.
    fn release(&mut self) {
        self.released = true;
        self.log.0.borrow_mut().releases += 1;
        debug!("Headless surface released");
    }
}
