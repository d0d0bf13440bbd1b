use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::world::{BroadPhaseKind, MaterialTable, MaterialTag, Shape};

pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Preset particle kinds. Each fixes the mass, shape and material of spawned bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleClass {
    Dust,   // Light, tiny spheres
    Pebble, // Default
    Crate,  // Heavy boxes
}

impl Default for ParticleClass {
    fn default() -> Self {
        Self::Pebble
    }
}

impl ParticleClass {
    pub fn mass(&self) -> f32 {
        match self {
            ParticleClass::Dust => 0.1,
            ParticleClass::Pebble => 1.0,
            ParticleClass::Crate => 13.0,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            ParticleClass::Dust => Shape::Sphere { radius: 0.1 },
            ParticleClass::Pebble => Shape::Sphere { radius: 0.25 },
            ParticleClass::Crate => Shape::Box { half_extents: [0.5, 0.5, 0.5] },
        }
    }

    pub fn material(&self) -> MaterialTag {
        match self {
            ParticleClass::Dust | ParticleClass::Pebble => MaterialTag::Particle,
            ParticleClass::Crate => MaterialTag::Stone,
        }
    }
}

/// Axis-aligned box that random spawn positions are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self { min: [-5.0, 10.0, -5.0], max: [5.0, 20.0, 5.0] }
    }
}

impl SpawnBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.to_array(), max: max.to_array() }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::from_array(self.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::from_array(self.max)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, (lo, hi)) in ['x', 'y', 'z'].into_iter().zip(self.min.iter().zip(self.max.iter())) {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(ConfigError::InvalidSpawnBounds { axis });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepSettings {
    pub enabled: bool,
    /// Linear speed (m/s) under which a body counts as resting.
    pub linear_speed_limit: f32,
    /// Angular speed (rad/s) under which a body counts as resting.
    pub angular_speed_limit: f32,
    /// Seconds a body must rest before it falls asleep.
    pub time_to_sleep: f32,
}

impl Default for SleepSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            linear_speed_limit: 0.1,
            angular_speed_limit: 0.1,
            time_to_sleep: 1.0,
        }
    }
}

/// How the frame loop maps wall-clock frames to fixed steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepMode {
    /// One fixed step per rendered frame; simulation speed follows the refresh rate.
    PerFrame,
    /// Fixed steps drawn from an accumulator of real frame time, capped per frame.
    Accumulated { max_substeps: u32 },
}

impl Default for StepMode {
    fn default() -> Self {
        Self::PerFrame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSettings {
    pub enabled: bool,
    pub height: f32,
    pub material: MaterialTag,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self { enabled: true, height: 0.0, material: MaterialTag::Ground }
    }
}

/// Physics parameters for one simulation session. Immutable once the scene is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub gravity: [f32; 3],
    pub fixed_timestep: f32,
    pub particle_count: usize,
    pub particle_class: ParticleClass,
    pub spawn_bounds: SpawnBounds,
    pub materials: MaterialTable,
    pub broad_phase: BroadPhaseKind,
    pub sleep: SleepSettings,
    pub ground: GroundSettings,
    pub step_mode: StepMode,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Approach speeds below this do not bounce.
    pub restitution_threshold: f32,
    /// Fixed seed for reproducible spawns; `None` draws from the OS.
    pub seed: Option<u64>,
    pub max_bodies: usize,
    pub max_spawns_per_frame: usize,
    /// Bodies spawned by a force-spawn key press.
    pub burst_count: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            fixed_timestep: DEFAULT_TIMESTEP,
            particle_count: 300,
            particle_class: ParticleClass::default(),
            spawn_bounds: SpawnBounds::default(),
            materials: MaterialTable::default(),
            broad_phase: BroadPhaseKind::default(),
            sleep: SleepSettings::default(),
            ground: GroundSettings::default(),
            step_mode: StepMode::default(),
            linear_damping: 0.01,
            angular_damping: 0.05,
            restitution_threshold: 1.0,
            seed: None,
            max_bodies: 2000,
            max_spawns_per_frame: 32,
            burst_count: 25,
        }
    }
}

impl SimulationConfig {
    /// Preset tuned for a particle class.
    pub fn for_class(class: ParticleClass) -> Self {
        let (particle_count, linear_damping, burst_count) = match class {
            ParticleClass::Dust => (500, 0.05, 50),
            ParticleClass::Pebble => (300, 0.01, 25),
            ParticleClass::Crate => (200, 0.0, 10),
        };
        Self {
            particle_class: class,
            particle_count,
            linear_damping,
            burst_count,
            ..Self::default()
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(ConfigError::InvalidGravity(self.gravity));
        }
        if !self.fixed_timestep.is_finite() || self.fixed_timestep <= 0.0 {
            return Err(ConfigError::InvalidTimestep(self.fixed_timestep));
        }
        // The ground plane occupies a body slot too.
        let initial_bodies = self.particle_count + self.ground.enabled as usize;
        if initial_bodies > self.max_bodies {
            return Err(ConfigError::TooManyParticles {
                count: initial_bodies,
                max_bodies: self.max_bodies,
            });
        }
        self.spawn_bounds.validate()?;
        self.materials.validate()?;
        let sleep = &self.sleep;
        let sleep_values = [sleep.linear_speed_limit, sleep.angular_speed_limit, sleep.time_to_sleep];
        if sleep_values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidSleepThresholds);
        }
        if let StepMode::Accumulated { max_substeps: 0 } = self.step_mode {
            return Err(ConfigError::InvalidSubsteps);
        }
        Ok(())
    }
}
