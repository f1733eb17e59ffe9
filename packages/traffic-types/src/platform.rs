use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::is_civilian_category;
use crate::error::{SimError, SimResult};
use crate::geo::{normalize_heading, Attitude, Position, Velocity};
use crate::platform_type::PlatformTypeDefinition;
use crate::snapshot::PlatformSnapshot;

pub type PlatformId = String;

/// The four domains a platform can belong to. Dispatch on this tag replaces
/// the class-hierarchy/embedding the original system used (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformVariant {
    Airborne,
    Maritime,
    Land,
    Space,
}

impl PlatformVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformVariant::Airborne => "airborne",
            PlatformVariant::Maritime => "maritime",
            PlatformVariant::Land => "land",
            PlatformVariant::Space => "space",
        }
    }
}

/// Full 3-D physics sub-record: acceleration, angular velocity, forces,
/// torques, and an estimated moment of inertia (diagonal, body axes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsState {
    pub acceleration: Velocity,
    pub angular_velocity: Attitude,
    pub forces: Velocity,
    pub torques: Attitude,
    pub moment_of_inertia: [f64; 3],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Navigation {
    pub destination: Option<Position>,
    pub waypoints: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub operational: bool,
    pub efficiency: f64,
}

impl SubsystemHealth {
    pub fn nominal() -> Self {
        Self { operational: true, efficiency: 1.0 }
    }

    pub fn disabled() -> Self {
        Self { operational: false, efficiency: 0.0 }
    }
}

impl Default for SubsystemHealth {
    fn default() -> Self {
        Self::nominal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemHealthSet {
    pub power: SubsystemHealth,
    pub propulsion: SubsystemHealth,
    pub navigation: SubsystemHealth,
    pub comms: SubsystemHealth,
    pub sensor: SubsystemHealth,
    pub fuel: SubsystemHealth,
    pub weapon: SubsystemHealth,
}

impl Default for SubsystemHealthSet {
    fn default() -> Self {
        Self {
            power: SubsystemHealth::nominal(),
            propulsion: SubsystemHealth::nominal(),
            navigation: SubsystemHealth::nominal(),
            comms: SubsystemHealth::nominal(),
            sensor: SubsystemHealth::nominal(),
            fuel: SubsystemHealth::nominal(),
            weapon: SubsystemHealth::nominal(),
        }
    }
}

/// Weapon readiness. Civilian platforms are always `NotApplicable` (I6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponStatus {
    Armed,
    Safe,
    #[serde(rename = "N/A")]
    NotApplicable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runtime {
    pub fuel_remaining: f64,
    pub mission_time: f64,
    pub health: SubsystemHealthSet,
    pub weapon_status: WeaponStatus,
}

/// One simulated entity: identity, kinematics, navigation, and runtime state.
///
/// The tagged `variant` field plus the four domain `advance_*` functions in
/// `traffic_sim::behaviour` stand in for the class hierarchy of the original
/// system (spec.md §9, Design Notes — Variant polymorphism).
#[derive(Debug, Clone)]
pub struct Platform {
    pub id: PlatformId,
    pub callsign: String,
    pub name: String,
    pub type_def: Arc<PlatformTypeDefinition>,
    pub variant: PlatformVariant,

    pub position: Position,
    pub velocity: Velocity,
    pub heading: f64,
    pub speed: f64,
    pub roll: f64,
    pub last_updated: DateTime<Utc>,
    pub physics: PhysicsState,

    pub navigation: Navigation,
    pub runtime: Runtime,
}

impl Platform {
    /// Construct a fresh platform at rest, applying invariants I2/I3/I6 and
    /// deriving a weapon-disarmed runtime state for civilian categories.
    pub fn new(
        id: PlatformId,
        name: String,
        callsign: String,
        type_def: Arc<PlatformTypeDefinition>,
        variant: PlatformVariant,
        mut position: Position,
        now: DateTime<Utc>,
    ) -> Self {
        if variant == PlatformVariant::Maritime {
            position.alt = 0.0;
        } else if variant == PlatformVariant::Space && type_def.performance.orbital_altitude > 0.0 && position.alt == 0.0 {
            position.alt = type_def.performance.orbital_altitude;
        }

        let civilian = is_civilian_category(&type_def.category);
        let mut health = SubsystemHealthSet::default();
        let weapon_status = if civilian {
            health.weapon = SubsystemHealth::disabled();
            WeaponStatus::NotApplicable
        } else if type_def.operational.weapon_systems.is_empty() {
            WeaponStatus::NotApplicable
        } else {
            WeaponStatus::Safe
        };

        let moment_of_inertia = estimate_moment_of_inertia(&type_def, variant);

        Self {
            id,
            callsign,
            name,
            runtime: Runtime {
                fuel_remaining: type_def.physical.fuel_capacity,
                mission_time: 0.0,
                health,
                weapon_status,
            },
            type_def,
            variant,
            position,
            velocity: Velocity::zero(),
            heading: 0.0,
            speed: 0.0,
            roll: 0.0,
            last_updated: now,
            physics: PhysicsState {
                moment_of_inertia,
                ..Default::default()
            },
            navigation: Navigation::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn platform_type(&self) -> &PlatformTypeDefinition {
        &self.type_def
    }

    pub fn class(&self) -> &str {
        &self.type_def.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn max_speed(&self) -> f64 {
        self.type_def.performance.max_speed
    }

    pub fn max_altitude(&self) -> f64 {
        self.type_def.performance.max_altitude
    }

    /// (length, width, height) bounding box, metres.
    pub fn extent(&self) -> (f64, f64, f64) {
        let p = &self.type_def.physical;
        (p.length, p.width, p.height)
    }

    pub fn mass(&self) -> f64 {
        self.type_def.physical.mass
    }

    pub fn is_civilian(&self) -> bool {
        is_civilian_category(&self.type_def.category)
    }

    pub fn snapshot(&self) -> PlatformSnapshot {
        PlatformSnapshot::from(self)
    }

    /// Replace the kinematic state wholesale, re-asserting the domain-specific
    /// invariants (I2 maritime altitude lock, I3 orbital altitude hold, I4
    /// heading normalisation, I5 non-negative fuel) that a raw overwrite could
    /// otherwise violate.
    pub fn apply_kinematics(
        &mut self,
        mut position: Position,
        mut velocity: Velocity,
        heading: f64,
        speed: f64,
        roll: f64,
        now: DateTime<Utc>,
    ) {
        if self.variant == PlatformVariant::Maritime {
            position.alt = 0.0;
            velocity.up = 0.0;
        }
        if self.variant == PlatformVariant::Space && self.type_def.performance.orbital_altitude > 0.0 {
            position.alt = self.type_def.performance.orbital_altitude;
        }

        self.position = position;
        self.velocity = velocity;
        self.heading = normalize_heading(heading);
        self.speed = speed.clamp(0.0, self.type_def.performance.max_speed.max(0.0));
        self.roll = roll;
        if now >= self.last_updated {
            self.last_updated = now;
        }
    }

    /// Set (or clear) the navigation destination, validating range per the
    /// same rules the scenario loader applies to initial positions.
    pub fn set_destination(&mut self, destination: Option<Position>) -> SimResult<()> {
        if let Some(dest) = destination {
            if !dest.in_valid_range() {
                return Err(SimError::InvalidDestination {
                    id: self.id.clone(),
                    reason: format!("position {:?} is out of range", dest),
                });
            }
        }
        self.navigation.destination = destination;
        Ok(())
    }
}

/// Estimate the diagonal moment-of-inertia tensor from the type's bounding
/// box and mass, using the formula appropriate to the variant (spec.md §4.4):
/// elongated ellipsoid for airborne, rectangular prism for maritime/land,
/// uniform sphere for space.
pub fn estimate_moment_of_inertia(type_def: &PlatformTypeDefinition, variant: PlatformVariant) -> [f64; 3] {
    let m = type_def.physical.mass.max(0.0);
    let (l, w, h) = (type_def.physical.length, type_def.physical.width, type_def.physical.height);

    match variant {
        PlatformVariant::Airborne => {
            // Elongated ellipsoid with semi-axes a=l/2, b=w/2, c=h/2.
            let (a, b, c) = (l / 2.0, w / 2.0, h / 2.0);
            [
                0.2 * m * (b * b + c * c),
                0.2 * m * (a * a + c * c),
                0.2 * m * (a * a + b * b),
            ]
        }
        PlatformVariant::Maritime | PlatformVariant::Land => {
            // Rectangular prism about its centroid.
            [
                m * (w * w + h * h) / 12.0,
                m * (l * l + h * h) / 12.0,
                m * (l * l + w * w) / 12.0,
            ]
        }
        PlatformVariant::Space => {
            // Uniform sphere, radius derived from the largest extent.
            let r = l.max(w).max(h) / 2.0;
            let i = 0.4 * m * r * r;
            [i, i, i]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_type::PlatformTypeDefinition;

    fn type_def(category: &str) -> Arc<PlatformTypeDefinition> {
        Arc::new(PlatformTypeDefinition {
            category: category.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn civilian_category_disarms_weapon_subsystem() {
        let td = type_def("commercial_aircraft");
        let p = Platform::new(
            "AA1".into(),
            "AA1".into(),
            "AAL1".into(),
            td,
            PlatformVariant::Airborne,
            Position::new(0.0, 0.0, 0.0),
            Utc::now(),
        );
        assert_eq!(p.runtime.weapon_status, WeaponStatus::NotApplicable);
        assert!(!p.runtime.health.weapon.operational);
    }

    #[test]
    fn maritime_altitude_locked_at_construction() {
        let td = type_def("military");
        let p = Platform::new(
            "DD1".into(),
            "DD1".into(),
            "DD1".into(),
            td,
            PlatformVariant::Maritime,
            Position::new(36.8, -76.3, 17.0),
            Utc::now(),
        );
        assert_eq!(p.position.alt, 0.0);
    }

    #[test]
    fn space_altitude_coerced_from_orbital_altitude_when_zero() {
        let mut base = PlatformTypeDefinition {
            category: "satellite".to_string(),
            ..Default::default()
        };
        base.performance.orbital_altitude = 550_000.0;
        let td = Arc::new(base);
        let p = Platform::new(
            "SAT1".into(),
            "SAT1".into(),
            "SAT1".into(),
            td,
            PlatformVariant::Space,
            Position::new(0.0, 0.0, 0.0),
            Utc::now(),
        );
        assert_eq!(p.position.alt, 550_000.0);
    }
}
