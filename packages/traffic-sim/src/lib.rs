pub mod behaviour;
pub mod clock;
pub mod cot;
pub mod engine;
pub mod geodesy;
pub mod scenario;

pub use clock::{FixedClock, RealClock, SimClock};
pub use engine::{Engine, EngineStatus};
pub use scenario::{ConfigError, PlatformInstanceSpec, ScenarioDocument};
