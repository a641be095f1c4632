// SPDX-License-Identifier: GPL-3.0-or-later

//! Schema Validator (C1): loads the three named JSON Schemas
//! (`statement`, `agent`, `langmap`) per supported xAPI version at
//! startup into a read-only registry, mirroring the teacher's `OnceLock`
//! Singleton style used for [`crate::config::config`].

use crate::{data::identity::V10X, MyError};
use jsonschema::Validator;
use serde_json::Value;
use std::{collections::HashMap, sync::OnceLock};

/// The three schema names a version must provide.
const NAMES: &[&str] = &["statement", "agent", "langmap"];

static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// The process-wide, read-only-after-init schema registry.
pub struct SchemaRegistry {
    by_version: HashMap<&'static str, HashMap<&'static str, Validator>>,
}

impl SchemaRegistry {
    fn load() -> Self {
        let mut by_version = HashMap::new();
        let mut schemas = HashMap::new();
        for name in NAMES {
            let raw = match *name {
                "statement" => include_str!("../../schemas/10x/statement.json"),
                "agent" => include_str!("../../schemas/10x/agent.json"),
                "langmap" => include_str!("../../schemas/10x/langmap.json"),
                _ => unreachable!(),
            };
            let doc: Value =
                serde_json::from_str(raw).unwrap_or_else(|e| panic!("Invalid {name} schema: {e}"));
            let validator = jsonschema::validator_for(&doc)
                .unwrap_or_else(|e| panic!("Failed compiling {name} schema: {e}"));
            schemas.insert(*name, validator);
        }
        by_version.insert(V10X, schemas);
        SchemaRegistry { by_version }
    }

    /// Validate `value` against the named schema for `version`. Returns an
    /// aggregated `BadRequest` error listing every violation on failure, or
    /// a `BadRequest` for an unknown version/name.
    pub fn validate(&self, version: &str, name: &str, value: &Value) -> Result<(), MyError> {
        let schemas = self
            .by_version
            .get(version)
            .ok_or_else(|| MyError::bad_request(format!("Unsupported xAPI version '{version}'")))?;
        let validator = schemas
            .get(name)
            .ok_or_else(|| MyError::bad_request(format!("Unknown schema '{name}'")))?;
        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|e| format!("{} at {}", e, e.instance_path()))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MyError::bad_request(format!(
                "Schema '{name}' violations: {}",
                errors.join("; ")
            )))
        }
    }
}

/// Return the process-wide [SchemaRegistry], initializing it on first use.
pub fn schema_registry() -> &'static SchemaRegistry {
    REGISTRY.get_or_init(SchemaRegistry::load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_statement() {
        let s = json!({
            "actor": {"mbox": "mailto:a@b.com"},
            "verb": {"id": "http://example.com/verbs/did"},
            "object": {"id": "http://example.com/activities/1"}
        });
        assert!(schema_registry().validate(V10X, "statement", &s).is_ok());
    }

    #[test]
    fn test_multi_ifi_rejected() {
        let s = json!({
            "actor": {"mbox": "mailto:a@b.com", "openid": "http://x.org/1"},
            "verb": {"id": "http://example.com/verbs/did"},
            "object": {"id": "http://example.com/activities/1"}
        });
        assert!(schema_registry().validate(V10X, "statement", &s).is_err());
    }

    #[test]
    fn test_unknown_version() {
        let s = json!({});
        assert!(schema_registry().validate("9.9.9", "statement", &s).is_err());
    }
}
