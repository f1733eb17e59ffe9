//! Declarative YAML scenario loading: type library + instance list → a
//! validated, instantiated platform population.
//!
//! Mirrors the teacher's `FullConfig`/`toml::from_str` shape in
//! `uwb-simulator/main.rs`, but deserialises YAML (the wire format this
//! system's config uses) and reports every validation failure at once
//! instead of stopping at the first one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use traffic_types::{Platform, PlatformTypeDefinition, PlatformVariant, Position};

/// One broken field in a scenario file, with enough context (file, instance,
/// field) to fix it without re-running the loader — mirrors the
/// file/instance-id context the teacher's persistence and audit logging
/// always carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub file: String,
    pub instance: Option<String>,
    pub field: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(instance) = &self.instance {
            write!(f, " (instance {instance})")?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field {field})")?;
        }
        write!(f, " [{}]", self.file)
    }
}

impl std::error::Error for ConfigError {}

/// Top-level scenario document: `platform_types` name → definition, plus the
/// instance list. Unknown keys are ignored by serde's default behaviour;
/// missing required keys fail `serde_yaml` parsing before validation runs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioDocument {
    #[serde(default)]
    pub platform_types: HashMap<String, PlatformTypeDefinition>,
    #[serde(default)]
    pub platforms: Vec<PlatformInstanceSpec>,
}

/// One instance in the scenario's `platforms` list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInstanceSpec {
    pub id: String,
    pub type_name: String,
    pub variant: PlatformVariant,
    #[serde(default)]
    pub name: Option<String>,
    pub position: Position,
    #[serde(default)]
    pub destination: Option<Position>,
}

fn validate_position(
    file: &str,
    instance: &str,
    field: &str,
    position: Position,
    errors: &mut Vec<ConfigError>,
) {
    if !position.is_finite() {
        errors.push(ConfigError {
            file: file.to_string(),
            instance: Some(instance.to_string()),
            field: Some(field.to_string()),
            message: "position must be finite".to_string(),
        });
        return;
    }
    if !(-90.0..=90.0).contains(&position.lat) {
        errors.push(ConfigError {
            file: file.to_string(),
            instance: Some(instance.to_string()),
            field: Some(format!("{field}.lat")),
            message: format!("latitude {} out of range [-90, 90]", position.lat),
        });
    }
    if !(position.lon > -180.0 && position.lon <= 180.0) {
        errors.push(ConfigError {
            file: file.to_string(),
            instance: Some(instance.to_string()),
            field: Some(format!("{field}.lon")),
            message: format!("longitude {} out of range (-180, 180]", position.lon),
        });
    }
}

/// Parse and validate a scenario document, collecting every error instead of
/// failing fast on the first one. `file` is used only for error context.
pub fn validate(file: &str, doc: &ScenarioDocument) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    for instance in &doc.platforms {
        if !doc.platform_types.contains_key(&instance.type_name) {
            errors.push(ConfigError {
                file: file.to_string(),
                instance: Some(instance.id.clone()),
                field: Some("typeName".to_string()),
                message: format!("unknown platform type '{}'", instance.type_name),
            });
        }

        validate_position(file, &instance.id, "position", instance.position, &mut errors);
        if let Some(destination) = instance.destination {
            validate_position(file, &instance.id, "destination", destination, &mut errors);
        }
    }

    errors
}

/// Parse a YAML document into a [`ScenarioDocument`]. Parse errors surface as
/// a single [`ConfigError`] with no instance context (the document itself
/// didn't deserialise).
pub fn parse(file: &str, yaml: &str) -> Result<ScenarioDocument, ConfigError> {
    serde_yaml::from_str(yaml).map_err(|e| ConfigError {
        file: file.to_string(),
        instance: None,
        field: None,
        message: format!("YAML parse error: {e}"),
    })
}

/// Per-type sequence counter used to expand `{seq}` in callsign templates.
#[derive(Debug, Default)]
struct CallsignFactory {
    counters: HashMap<String, u32>,
}

impl CallsignFactory {
    fn next(&mut self, type_name: &str, type_def: &PlatformTypeDefinition, id: &str) -> String {
        let seq = self.counters.entry(type_name.to_string()).or_insert(0);
        *seq += 1;
        type_def.callsign.expand(type_name, id, *seq)
    }
}

/// Instantiate a validated [`ScenarioDocument`] into a ready platform
/// population. Assumes `validate` has already been run and returned no
/// errors — callers that skip validation get best-effort behaviour (a
/// missing type name instantiates nothing for that instance).
pub fn instantiate(doc: &ScenarioDocument, now: DateTime<Utc>) -> Vec<Platform> {
    let mut factory = CallsignFactory::default();
    let mut platforms = Vec::with_capacity(doc.platforms.len());

    for instance in &doc.platforms {
        let Some(type_def) = doc.platform_types.get(&instance.type_name) else {
            continue;
        };
        let type_def = Arc::new(type_def.clone());
        let callsign = factory.next(&instance.type_name, &type_def, &instance.id);
        let name = instance.name.clone().unwrap_or_else(|| instance.id.clone());

        let mut platform = Platform::new(
            instance.id.clone(),
            name,
            callsign,
            type_def,
            instance.variant,
            instance.position,
            now,
        );

        if let Some(destination) = instance.destination {
            let _ = platform.set_destination(Some(destination));
        }

        platforms.push(platform);
    }

    platforms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
platform_types:
  b738:
    class: "Boeing 737-800"
    category: "commercial_aircraft"
    performance:
      maxSpeed: 257.0
      cruiseSpeed: 230.0
      turningRadius: 3000.0
      acceleration: 1.5
      climbRate: 12.0
    callsign:
      pattern: "AAL{seq}"
platforms:
  - id: "AA1234"
    typeName: "b738"
    variant: airborne
    position: { lat: 40.7128, lon: -74.0060, alt: 10000.0 }
    destination: { lat: 25.7617, lon: -80.1918, alt: 10000.0 }
"#
    }

    #[test]
    fn parses_and_validates_a_clean_scenario() {
        let doc = parse("scenario.yaml", sample_yaml()).unwrap();
        let errors = validate("scenario.yaml", &doc);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn unknown_type_name_is_reported_with_instance_context() {
        let doc = parse(
            "scenario.yaml",
            r#"
platform_types: {}
platforms:
  - id: "X1"
    typeName: "missing"
    variant: airborne
    position: { lat: 0.0, lon: 0.0, alt: 0.0 }
"#,
        )
        .unwrap();
        let errors = validate("scenario.yaml", &doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].instance.as_deref(), Some("X1"));
    }

    #[test]
    fn out_of_range_position_is_reported() {
        let doc = parse(
            "scenario.yaml",
            r#"
platform_types:
  t:
    class: "t"
platforms:
  - id: "X1"
    typeName: "t"
    variant: airborne
    position: { lat: 95.0, lon: 0.0, alt: 0.0 }
"#,
        )
        .unwrap();
        let errors = validate("scenario.yaml", &doc);
        assert!(errors.iter().any(|e| e.field.as_deref() == Some("position.lat")));
    }

    #[test]
    fn instantiate_produces_expanded_callsign_and_destination() {
        let doc = parse("scenario.yaml", sample_yaml()).unwrap();
        let platforms = instantiate(&doc, Utc::now());
        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0].callsign, "AAL1");
        assert!(platforms[0].navigation.destination.is_some());
    }
}
