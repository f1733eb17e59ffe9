use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{Position, Velocity};
use crate::platform::Platform;

/// Read-only wire projection of a [`Platform`], in the exact field order and
/// naming the pull/duplex/fallback surfaces all serialize (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub class: String,
    /// The type definition's category tag (e.g. "commercial-airliner").
    /// Not part of the documented visualisation wire contract (spec.md §6)
    /// — kept off the serialized frame — but needed by the CoT serializer
    /// (spec.md §4.6) to derive affiliation and MIL-STD-2525 category
    /// suffix, which `class` alone doesn't reliably encode.
    #[serde(skip)]
    pub category: String,
    pub name: String,
    pub callsign: String,
    pub position: Position,
    pub velocity: Velocity,
    pub heading: f64,
    pub speed: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<&Platform> for PlatformSnapshot {
    fn from(p: &Platform) -> Self {
        Self {
            id: p.id.clone(),
            type_name: p.variant.as_str().to_string(),
            class: p.class().to_string(),
            category: p.type_def.category.clone(),
            name: p.name.clone(),
            callsign: p.callsign.clone(),
            position: p.position,
            velocity: p.velocity,
            heading: p.heading,
            speed: p.speed,
            last_updated: p.last_updated,
        }
    }
}

impl From<Platform> for PlatformSnapshot {
    fn from(p: Platform) -> Self {
        Self::from(&p)
    }
}
