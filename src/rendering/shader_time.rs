use bytemuck::{Pod, Zeroable};
use tracing::{debug, warn};

/// Scene-wide shading clock. Monotonic; only a scene remount resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShaderTimeState {
    pub time: f32,
    pub delta: f32,
    pub frame: u32,
}

/// GPU-side layout of the time uniform. Padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TimeUniform {
    pub time: f32,
    pub delta: f32,
    pub frame: u32,
    pub _padding: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(usize);

#[derive(Debug, Clone)]
struct ProgramClock {
    name: String,
    rate: f32,
    uniform: TimeUniform,
}

/// Feeds elapsed time to procedural shading programs.
///
/// Every program reads the same wall-clock source; a program may scale it by a
/// constant rate, which is how slow-drifting and fast-animated surfaces share a scene.
#[derive(Debug, Clone, Default)]
pub struct ShaderTimeDriver {
    state: ShaderTimeState,
    last_elapsed: Option<f64>,
    programs: Vec<ProgramClock>,
}

impl ShaderTimeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_program(&mut self, name: impl Into<String>, rate: f32) -> ProgramId {
        let name = name.into();
        let rate = if rate.is_finite() && rate >= 0.0 {
            rate
        } else {
            warn!("Invalid time rate {} for shader program {}, using 1.0", rate, name);
            1.0
        };
        debug!("Registered shader program {} at rate {}", name, rate);
        self.programs.push(ProgramClock { name, rate, uniform: TimeUniform::default() });
        ProgramId(self.programs.len() - 1)
    }

    /// Advance to wall-clock `elapsed` seconds and rewrite every program's uniform.
    /// Timestamps earlier than the last tick are ignored.
    pub fn tick(&mut self, elapsed: f64) -> ShaderTimeState {
        let previous = self.last_elapsed.unwrap_or(0.0);
        if !elapsed.is_finite() || elapsed < previous {
            debug!("Ignoring non-monotonic shader tick {} (last {})", elapsed, previous);
            return self.state;
        }
        self.last_elapsed = Some(elapsed);
        self.state = ShaderTimeState {
            time: elapsed as f32,
            delta: (elapsed - previous) as f32,
            frame: self.state.frame.wrapping_add(1),
        };
        for program in &mut self.programs {
            program.uniform = TimeUniform {
                time: self.state.time * program.rate,
                delta: self.state.delta * program.rate,
                frame: self.state.frame,
                _padding: 0,
            };
        }
        self.state
    }

    pub fn state(&self) -> ShaderTimeState {
        self.state
    }

    pub fn uniform(&self, program: ProgramId) -> Option<TimeUniform> {
        self.programs.get(program.0).map(|p| p.uniform)
    }

    pub fn program_name(&self, program: ProgramId) -> Option<&str> {
        self.programs.get(program.0).map(|p| p.name.as_str())
    }

    /// Back to time zero. Programs stay registered.
    pub fn reset(&mut self) {
        self.state = ShaderTimeState::default();
        self.last_elapsed = None;
        for program in &mut self.programs {
            program.uniform = TimeUniform::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programs_share_one_clock() {
        let mut driver = ShaderTimeDriver::new();
        let surface = driver.register_program("surface", 1.0);
        let backdrop = driver.register_program("backdrop", 0.25);
        driver.tick(2.0);
        assert_eq!(driver.uniform(surface).unwrap().time, 2.0);
        assert_eq!(driver.uniform(backdrop).unwrap().time, 0.5);
        assert_eq!(driver.uniform(backdrop).unwrap().frame, 1);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut driver = ShaderTimeDriver::new();
        let id = driver.register_program("surface", 1.0);
        driver.tick(1.5);
        let state = driver.tick(0.5);
        assert_eq!(state.time, 1.5);
        assert_eq!(driver.uniform(id).unwrap().time, 1.5);
        assert_eq!(driver.tick(2.0).delta, 0.5);
    }

    #[test]
    fn uniform_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<TimeUniform>(), 16);
    }
}
