pub mod body;
pub mod broad_phase;
pub mod events;
pub mod factory;
pub mod materials;
pub mod physics;

pub use body::{BodySpec, PhysicsBody, Shape, SleepState};
pub use broad_phase::BroadPhaseKind;
pub use events::{InputEvent, InputHandle, InputQueue, SceneKey, SpawnRequest};
pub use factory::ParticleBodyFactory;
pub use materials::{ContactMaterialRule, ContactProperties, MaterialTable, MaterialTag};
pub use physics::{SimulationWorld, StepStats};
