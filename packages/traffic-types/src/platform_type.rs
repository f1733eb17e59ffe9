use serde::{Deserialize, Serialize};

/// Performance envelope: the physical limits the behaviour layer must respect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Performance {
    pub max_speed: f64,
    pub cruise_speed: f64,
    pub max_altitude: f64,
    pub acceleration: f64,
    pub turning_radius: f64,
    pub climb_rate: f64,
    pub max_gradient: f64,
    pub fuel_consumption: f64,
    pub orbital_period: f64,
    pub orbital_velocity: f64,
    pub orbital_altitude: f64,
    pub inclination: f64,
    pub eccentricity: f64,
    pub stall_speed: f64,
    pub max_roll_rate: f64,
    pub max_pitch_rate: f64,
    pub max_yaw_rate: f64,
    pub max_bank_angle: f64,
    pub max_pitch_angle: f64,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            max_speed: 0.0,
            cruise_speed: 0.0,
            max_altitude: 0.0,
            acceleration: 0.0,
            turning_radius: 0.0,
            climb_rate: 10.0,
            max_gradient: 0.0,
            fuel_consumption: 0.0,
            orbital_period: 0.0,
            orbital_velocity: 0.0,
            orbital_altitude: 0.0,
            inclination: 0.0,
            eccentricity: 0.0,
            stall_speed: 0.0,
            max_roll_rate: 0.0,
            max_pitch_rate: 0.0,
            max_yaw_rate: 0.0,
            max_bank_angle: 0.0,
            max_pitch_angle: 0.0,
        }
    }
}

/// Physical dimensions used for bounding-box inertia estimation and CoT sizing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Physical {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub mass: f64,
    pub fuel_capacity: f64,
    pub draft: f64,
    pub wing_area: f64,
    pub wet_area: f64,
    pub frontal_area: f64,
    pub center_of_gravity: [f64; 3],
}

/// Mission-level capacity and equipment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operational {
    pub range: f64,
    pub crew_capacity: u32,
    pub passenger_capacity: u32,
    pub cargo_capacity: f64,
    pub mission_life: f64,
    pub weapon_systems: Vec<String>,
}

/// Onboard sensor suite.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sensors {
    pub has_gps: bool,
    pub has_radar: bool,
    pub has_compass: bool,
    pub radar_range: f64,
    pub sensor_range: f64,
}

/// Callsign generation template, expanded at instantiation time.
///
/// `pattern` may reference `{type}`, `{id}`, and `{seq}` placeholders; `{seq}`
/// is a per-type monotonically increasing counter maintained by the factory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallsignTemplate {
    pub pattern: String,
    pub prefix: String,
}

impl CallsignTemplate {
    pub fn expand(&self, type_name: &str, id: &str, seq: u32) -> String {
        if self.pattern.is_empty() {
            return format!("{}{}", self.prefix, id);
        }
        self.pattern
            .replace("{type}", type_name)
            .replace("{id}", id)
            .replace("{seq}", &seq.to_string())
    }
}

/// Immutable type-library entry describing one class of platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformTypeDefinition {
    pub class: String,
    pub category: String,
    pub performance: Performance,
    pub physical: Physical,
    pub operational: Operational,
    pub sensors: Sensors,
    pub callsign: CallsignTemplate,
}

impl Default for PlatformTypeDefinition {
    fn default() -> Self {
        Self {
            class: String::new(),
            category: String::new(),
            performance: Performance::default(),
            physical: Physical::default(),
            operational: Operational::default(),
            sensors: Sensors::default(),
            callsign: CallsignTemplate::default(),
        }
    }
}
