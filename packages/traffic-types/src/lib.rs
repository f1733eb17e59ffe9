pub mod category;
pub mod error;
pub mod geo;
pub mod platform;
pub mod platform_type;
pub mod snapshot;

pub use category::is_civilian_category;
pub use error::{SimError, SimResult};
pub use geo::{normalize_heading, wrap_longitude, Attitude, Position, Velocity};
pub use platform::{
    estimate_moment_of_inertia, Navigation, Platform, PlatformId, PlatformVariant, PhysicsState,
    Runtime, SubsystemHealth, SubsystemHealthSet, WeaponStatus,
};
pub use platform_type::{
    CallsignTemplate, Operational, Performance, Physical, PlatformTypeDefinition, Sensors,
};
pub use snapshot::PlatformSnapshot;
