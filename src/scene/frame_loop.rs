use tracing::{debug, info, warn};

use crate::config::StepMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Running,
    Disposed,
}

/// Token for the next display-refresh callback. Taken when the frame starts and
/// re-issued when it completes; disposal drops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn frame_index(&self) -> u64 {
        self.0
    }
}

/// What one frame is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub frame_index: u64,
    /// Seconds since the first frame after mount.
    pub local_time: f64,
    /// Fixed physics steps to take this frame.
    pub steps: u32,
}

/// Drives a mounted scene: frame indices, the time origin and how many fixed steps
/// each frame takes.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    state: FrameState,
    pending: Option<FrameRequest>,
    frames: u64,
    epoch: Option<f64>,
    last_local: f64,
    accumulator: f64,
    step_mode: StepMode,
    fixed_timestep: f64,
}

impl FrameLoop {
    /// A running loop with its first frame requested.
    pub fn start(step_mode: StepMode, fixed_timestep: f32) -> Self {
        info!("Frame loop started ({:?}, dt = {:.4}s)", step_mode, fixed_timestep);
        Self {
            state: FrameState::Running,
            pending: Some(FrameRequest(0)),
            frames: 0,
            epoch: None,
            last_local: 0.0,
            accumulator: 0.0,
            step_mode,
            fixed_timestep: fixed_timestep as f64,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == FrameState::Running
    }

    pub fn pending_request(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start a frame at wall-clock `elapsed`. `None` once disposed.
    pub fn begin_frame(&mut self, elapsed: f64) -> Option<FrameTiming> {
        if !self.is_running() {
            return None;
        }
        if self.pending.take().is_none() {
            debug!("Frame {} started without a pending request", self.frames);
        }
        let local_time = if elapsed.is_finite() {
            let epoch = *self.epoch.get_or_insert(elapsed);
            // Clocks never run backwards for the scene
            (elapsed - epoch).max(self.last_local)
        } else {
            debug!("Ignoring non-finite timestamp {} on frame {}", elapsed, self.frames);
            self.last_local
        };
        let delta = local_time - self.last_local;
        self.last_local = local_time;

        let steps = match self.step_mode {
            StepMode::PerFrame => 1,
            StepMode::Accumulated { max_substeps } => self.accumulate(delta, max_substeps),
        };

        let frame_index = self.frames;
        self.frames += 1;
        Some(FrameTiming { frame_index, local_time, steps })
    }

    fn accumulate(&mut self, delta: f64, max_substeps: u32) -> u32 {
        self.accumulator += delta;
        let available = (self.accumulator / self.fixed_timestep).floor() as u32;
        let steps = available.min(max_substeps);
        self.accumulator -= steps as f64 * self.fixed_timestep;
        if available > max_substeps {
            warn!("Frame behind by {} steps, dropping the backlog", available - max_substeps);
            self.accumulator %= self.fixed_timestep;
        }
        steps
    }

    /// Schedule the next refresh callback.
    pub fn request_next_frame(&mut self) {
        if self.is_running() {
            self.pending = Some(FrameRequest(self.frames));
        }
    }

    /// Running -> Disposed, cancelling any pending request. Returns false if
    /// already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.state == FrameState::Disposed {
            return false;
        }
        if let Some(request) = self.pending.take() {
            debug!("Cancelled pending frame request {}", request.frame_index());
        }
        self.state = FrameState::Disposed;
        info!("Frame loop disposed after {} frames", self.frames);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_frame_mode_takes_one_step_regardless_of_interval() {
        let mut frame_loop = FrameLoop::start(StepMode::PerFrame, 1.0 / 60.0);
        for elapsed in [0.0, 0.001, 0.5, 3.0] {
            let timing = frame_loop.begin_frame(elapsed).unwrap();
            assert_eq!(timing.steps, 1);
            frame_loop.request_next_frame();
        }
        assert_eq!(frame_loop.frames(), 4);
    }

    #[test]
    fn first_frame_defines_the_time_origin() {
        let mut frame_loop = FrameLoop::start(StepMode::PerFrame, 0.25);
        assert_eq!(frame_loop.begin_frame(7.0).unwrap().local_time, 0.0);
        assert_eq!(frame_loop.begin_frame(7.5).unwrap().local_time, 0.5);
        // Backwards timestamps hold the clock
        assert_eq!(frame_loop.begin_frame(7.25).unwrap().local_time, 0.5);
    }

    #[test]
    fn non_finite_timestamps_hold_the_clock() {
        let mut frame_loop = FrameLoop::start(StepMode::PerFrame, 0.25);
        let timing = frame_loop.begin_frame(f64::NAN).unwrap();
        assert_eq!(timing.local_time, 0.0);
        assert_eq!(timing.steps, 1);
        // The first finite timestamp still becomes the origin
        assert_eq!(frame_loop.begin_frame(2.0).unwrap().local_time, 0.0);
        assert_eq!(frame_loop.begin_frame(2.5).unwrap().local_time, 0.5);
        assert_eq!(frame_loop.begin_frame(f64::INFINITY).unwrap().local_time, 0.5);
        assert_eq!(frame_loop.begin_frame(3.0).unwrap().local_time, 1.0);
        assert_eq!(frame_loop.frames(), 5);
    }

    #[test]
    fn accumulator_caps_substeps_and_drops_backlog() {
        let mut frame_loop = FrameLoop::start(StepMode::Accumulated { max_substeps: 4 }, 0.25);
        assert_eq!(frame_loop.begin_frame(0.0).unwrap().steps, 0);
        assert_eq!(frame_loop.begin_frame(0.5).unwrap().steps, 2);
        assert_eq!(frame_loop.begin_frame(0.625).unwrap().steps, 0);
        assert_eq!(frame_loop.begin_frame(0.75).unwrap().steps, 1);
        assert_eq!(frame_loop.begin_frame(10.75).unwrap().steps, 4);
        assert_eq!(frame_loop.begin_frame(11.0).unwrap().steps, 1);
    }

    #[test]
    fn dispose_cancels_pending_request_and_stops_frames() {
        let mut frame_loop = FrameLoop::start(StepMode::PerFrame, 1.0 / 60.0);
        assert!(frame_loop.pending_request().is_some());
        assert!(frame_loop.dispose());
        assert!(!frame_loop.dispose());
        assert_eq!(frame_loop.state(), FrameState::Disposed);
        assert!(frame_loop.pending_request().is_none());
        assert!(frame_loop.begin_frame(1.0).is_none());
        frame_loop.request_next_frame();
        assert!(frame_loop.pending_request().is_none());
    }
}
