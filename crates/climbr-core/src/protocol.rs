//! Exercise protocols.
//!
//! A protocol is the declarative description of a workout: how many sets,
//! how many reps, and how long each piece of work or rest lasts. The catalog
//! ships them in the shape `{ "kind": "...", "default": { ... } }`, which is
//! exactly how [`Protocol`] serializes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};

/// Timed hangs/holds: every rep is a fixed-length piece of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimedRepsSets {
    pub sets: u32,
    pub reps_per_set: u32,
    pub work_sec_per_rep: u32,
    pub rest_sec_between_reps: u32,
    pub rest_sec_between_sets: u32,
}

/// Weighted sets: the athlete reports each set done by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeightsRepsSets {
    pub sets: u32,
    pub reps_per_set: u32,
    pub rest_sec_between_sets: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "default", rename_all = "snake_case")]
pub enum Protocol {
    TimedRepsSets(TimedRepsSets),
    WeightsRepsSets(WeightsRepsSets),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    TimedRepsSets,
    WeightsRepsSets,
}

impl ProtocolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::TimedRepsSets => "timed_reps_sets",
            ProtocolKind::WeightsRepsSets => "weights_reps_sets",
        }
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Protocol {
    pub fn kind(&self) -> ProtocolKind {
        match self {
            Protocol::TimedRepsSets(_) => ProtocolKind::TimedRepsSets,
            Protocol::WeightsRepsSets(_) => ProtocolKind::WeightsRepsSets,
        }
    }

    pub fn sets(&self) -> u32 {
        match self {
            Protocol::TimedRepsSets(p) => p.sets,
            Protocol::WeightsRepsSets(p) => p.sets,
        }
    }

    pub fn reps_per_set(&self) -> u32 {
        match self {
            Protocol::TimedRepsSets(p) => p.reps_per_set,
            Protocol::WeightsRepsSets(p) => p.reps_per_set,
        }
    }

    /// Check the count invariants (`sets >= 1`, `repsPerSet >= 1`).
    ///
    /// Durations are unsigned, so they can't be out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sets() == 0 {
            return Err(ValidationError::ZeroCount { field: "sets" });
        }
        if self.reps_per_set() == 0 {
            return Err(ValidationError::ZeroCount {
                field: "repsPerSet",
            });
        }
        Ok(())
    }

    /// Build a protocol from a kind tag and a user-edited config payload.
    ///
    /// The payload must carry exactly the fields of `kind`; anything else is
    /// rejected rather than silently ignored.
    pub fn from_config(kind: ProtocolKind, config: serde_json::Value) -> Result<Self> {
        let tagged = serde_json::json!({ "kind": kind.as_str(), "default": config });
        let protocol: Protocol = serde_json::from_value(tagged)?;
        protocol.validate()?;
        Ok(protocol)
    }

    /// Return a copy with one numeric field replaced.
    ///
    /// `key` is the camelCase field name as it appears under `default`.
    pub fn with_override(&self, key: &str, value: u32) -> Result<Self> {
        let mut config = match serde_json::to_value(self)? {
            serde_json::Value::Object(mut root) => root
                .remove("default")
                .unwrap_or(serde_json::Value::Null),
            _ => serde_json::Value::Null,
        };
        let fields = config
            .as_object_mut()
            .ok_or_else(|| CoreError::Custom("protocol payload is not an object".into()))?;
        if !fields.contains_key(key) {
            return Err(ValidationError::InvalidValue {
                field: key.to_string(),
                message: format!("not a field of {}", self.kind()),
            }
            .into());
        }
        fields.insert(key.to_string(), value.into());
        Self::from_config(self.kind(), config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let protocol: Protocol = serde_json::from_str(json)?;
        protocol.validate()?;
        Ok(protocol)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let protocol: Protocol = toml::from_str(content)?;
        protocol.validate()?;
        Ok(protocol)
    }

    /// Load a protocol file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(ValidationError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANG_JSON: &str = r#"{
        "kind": "timed_reps_sets",
        "default": {
            "sets": 3,
            "repsPerSet": 6,
            "workSecPerRep": 7,
            "restSecBetweenReps": 3,
            "restSecBetweenSets": 120
        }
    }"#;

    #[test]
    fn parses_catalog_shape() {
        let p = Protocol::from_json(HANG_JSON).unwrap();
        assert_eq!(p.kind(), ProtocolKind::TimedRepsSets);
        match p {
            Protocol::TimedRepsSets(t) => {
                assert_eq!(t.sets, 3);
                assert_eq!(t.reps_per_set, 6);
                assert_eq!(t.work_sec_per_rep, 7);
                assert_eq!(t.rest_sec_between_sets, 120);
            }
            _ => panic!("Expected TimedRepsSets"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Protocol::from_json(r#"{"kind":"yoga","default":{"sets":1}}"#).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn fields_of_other_kind_are_rejected() {
        let json = r#"{"kind":"weights_reps_sets","default":{
            "sets":2,"repsPerSet":5,"restSecBetweenSets":60,"workSecPerRep":7}}"#;
        assert!(matches!(Protocol::from_json(json), Err(CoreError::Json(_))));
    }

    #[test]
    fn zero_sets_fail_validation() {
        let json = r#"{"kind":"weights_reps_sets","default":{
            "sets":0,"repsPerSet":5,"restSecBetweenSets":60}}"#;
        match Protocol::from_json(json) {
            Err(CoreError::Validation(ValidationError::ZeroCount { field })) => {
                assert_eq!(field, "sets");
            }
            other => panic!("Expected ZeroCount, got {other:?}"),
        }
    }

    #[test]
    fn toml_protocol() {
        let content = r#"
kind = "weights_reps_sets"

[default]
sets = 4
repsPerSet = 5
restSecBetweenSets = 180
"#;
        let p = Protocol::from_toml(content).unwrap();
        assert_eq!(
            p,
            Protocol::WeightsRepsSets(WeightsRepsSets {
                sets: 4,
                reps_per_set: 5,
                rest_sec_between_sets: 180,
            })
        );
    }

    #[test]
    fn from_config_uses_kind_tag() {
        let config = serde_json::json!({ "sets": 2, "repsPerSet": 8, "restSecBetweenSets": 90 });
        let p = Protocol::from_config(ProtocolKind::WeightsRepsSets, config).unwrap();
        assert_eq!(p.sets(), 2);
        assert_eq!(p.reps_per_set(), 8);
    }

    #[test]
    fn override_replaces_one_field() {
        let p = Protocol::from_json(HANG_JSON).unwrap();
        let q = p.with_override("sets", 5).unwrap();
        assert_eq!(q.sets(), 5);
        assert_eq!(q.reps_per_set(), 6);

        assert!(p.with_override("targetReps", 5).is_err());
        assert!(p.with_override("repsPerSet", 0).is_err());
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hang.json");
        std::fs::write(&path, HANG_JSON).unwrap();
        assert_eq!(Protocol::load(&path).unwrap().sets(), 3);

        let bad = dir.path().join("hang.yaml");
        std::fs::write(&bad, HANG_JSON).unwrap();
        assert!(matches!(
            Protocol::load(&bad),
            Err(CoreError::Validation(ValidationError::UnsupportedFormat(_)))
        ));
    }
}
