//! Transport-neutral control surface (C9): CRUD on the platform registry
//! plus simulation start/stop/reset/status/speed. Axum handlers in
//! `routes.rs` are a thin translation layer over these functions — the same
//! split the teacher keeps between `handlers.rs` (transport) and the engine
//! types it drives.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use traffic_sim::{Engine, EngineStatus};
use traffic_types::{Platform, PlatformId, PlatformSnapshot, PlatformTypeDefinition, PlatformVariant, Position, SimError, SimResult};

use crate::multicast::MulticastCounters;

/// Specification for `createPlatform`. Validated with the same rules C4
/// applies to scenario instances.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlatformSpec {
    pub id: PlatformId,
    pub variant: PlatformVariant,
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub platform_type: PlatformTypeDefinition,
    pub position: Position,
    pub destination: Option<Position>,
}

/// Patch for `updatePlatform`. Every field is optional; only present fields
/// are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPatch {
    pub name: Option<String>,
    pub callsign: Option<String>,
    #[serde(default, deserialize_with = "deserialize_destination_patch")]
    pub destination: Option<Option<Position>>,
}

/// Distinguishes "field absent" from "field present and null" so a patch can
/// explicitly clear a destination.
fn deserialize_destination_patch<'de, D>(deserializer: D) -> Result<Option<Option<Position>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticastStatus {
    pub enabled: bool,
    pub group: String,
    pub port: u16,
    pub sent_frames: u64,
    pub errors: u64,
}

fn validate_spec(spec: &CreatePlatformSpec) -> SimResult<()> {
    if spec.id.trim().is_empty() {
        return Err(SimError::ConfigInvalid {
            file: "control:createPlatform".to_string(),
            instance: None,
            field: Some("id".to_string()),
            message: "id must not be empty".to_string(),
        });
    }
    if !spec.position.in_valid_range() {
        return Err(SimError::ConfigInvalid {
            file: "control:createPlatform".to_string(),
            instance: Some(spec.id.clone()),
            field: Some("position".to_string()),
            message: "position out of range".to_string(),
        });
    }
    if let Some(destination) = spec.destination {
        if !destination.in_valid_range() {
            return Err(SimError::ConfigInvalid {
                file: "control:createPlatform".to_string(),
                instance: Some(spec.id.clone()),
                field: Some("destination".to_string()),
                message: "destination out of range".to_string(),
            });
        }
    }
    Ok(())
}

pub async fn list_platforms(engine: &Engine) -> Vec<PlatformSnapshot> {
    engine.snapshot().await
}

pub async fn get_platform(engine: &Engine, id: &str) -> SimResult<PlatformSnapshot> {
    engine
        .get_snapshot(id)
        .await
        .ok_or_else(|| SimError::RegistryNotFound { id: id.to_string() })
}

pub async fn create_platform(engine: &Engine, spec: CreatePlatformSpec) -> SimResult<PlatformId> {
    validate_spec(&spec)?;
    if engine.contains_platform(&spec.id).await {
        return Err(SimError::ConfigInvalid {
            file: "control:createPlatform".to_string(),
            instance: Some(spec.id.clone()),
            field: Some("id".to_string()),
            message: "a platform with this id already exists".to_string(),
        });
    }

    let type_def = Arc::new(spec.platform_type);
    let callsign = spec.callsign.unwrap_or_else(|| type_def.callsign.expand("custom", &spec.id, 1));
    let name = spec.name.unwrap_or_else(|| spec.id.clone());

    let mut platform = Platform::new(spec.id.clone(), name, callsign, type_def, spec.variant, spec.position, Utc::now());
    if let Some(destination) = spec.destination {
        platform.set_destination(Some(destination))?;
    }

    let id = platform.id.clone();
    engine.insert_platform(platform).await;
    Ok(id)
}

pub async fn update_platform(engine: &Engine, id: &str, patch: PlatformPatch) -> SimResult<()> {
    if let Some(Some(destination)) = patch.destination {
        if !destination.in_valid_range() {
            return Err(SimError::InvalidDestination {
                id: id.to_string(),
                reason: "destination out of range".to_string(),
            });
        }
    }

    engine
        .mutate_platform(id, |platform| {
            if let Some(name) = patch.name {
                platform.name = name;
            }
            if let Some(callsign) = patch.callsign {
                platform.callsign = callsign;
            }
            if let Some(destination) = patch.destination {
                let _ = platform.set_destination(destination);
            }
        })
        .await
}

pub async fn delete_platform(engine: &Engine, id: &str) -> SimResult<()> {
    engine
        .remove_platform(id)
        .await
        .map(|_| ())
        .ok_or_else(|| SimError::RegistryNotFound { id: id.to_string() })
}

pub async fn simulation_status(engine: &Engine) -> EngineStatus {
    engine.status().await
}

pub async fn start_simulation(engine: &Arc<Engine>) {
    engine.start().await;
}

pub async fn stop_simulation(engine: &Arc<Engine>) {
    engine.stop().await;
}

pub async fn reset_simulation(engine: &Arc<Engine>) {
    engine.reset().await;
}

pub async fn set_speed(engine: &Engine, k: f64) -> SimResult<()> {
    engine.set_time_scale(k).await
}

pub async fn multicast_status(enabled: bool, group: &str, port: u16, counters: Option<&MulticastCounters>) -> MulticastStatus {
    let (sent_frames, errors) = match counters {
        Some(c) => (
            c.sent_frames.load(std::sync::atomic::Ordering::Relaxed),
            c.errors.load(std::sync::atomic::Ordering::Relaxed),
        ),
        None => (0, 0),
    };
    MulticastStatus { enabled, group: group.to_string(), port, sent_frames, errors }
}
