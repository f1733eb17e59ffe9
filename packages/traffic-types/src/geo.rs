use serde::{Deserialize, Serialize};

/// Geographic position: latitude/longitude in degrees, altitude in metres MSL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.alt.is_finite()
    }

    /// True when lat/lon fall within the ranges the scenario loader requires:
    /// lat in [-90, 90], lon in (-180, 180].
    pub fn in_valid_range(&self) -> bool {
        self.is_finite() && (-90.0..=90.0).contains(&self.lat) && self.lon > -180.0 && self.lon <= 180.0
    }
}

/// Velocity in the local north/east/up frame, metres per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Velocity {
    #[serde(rename = "n")]
    pub north: f64,
    #[serde(rename = "e")]
    pub east: f64,
    #[serde(rename = "u")]
    pub up: f64,
}

impl Velocity {
    pub fn new(north: f64, east: f64, up: f64) -> Self {
        Self { north, east, up }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn horizontal_speed(&self) -> f64 {
        (self.north * self.north + self.east * self.east).sqrt()
    }
}

/// Attitude: roll/pitch/yaw in degrees. Yaw is equivalent to heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Normalise a heading (or any angle) to [0, 360).
pub fn normalize_heading(deg: f64) -> f64 {
    let wrapped = deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Wrap a longitude-style angle to (-180, 180].
pub fn wrap_longitude(deg: f64) -> f64 {
    let mut wrapped = (deg + 180.0) % 360.0;
    if wrapped <= 0.0 {
        wrapped += 360.0;
    }
    wrapped - 180.0
}
