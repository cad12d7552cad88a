use crate::core::entries::schema::ConfigEntry;
use raymon_error::error::SetupError;
use raymon_settings::config::{DEFAULT_PORT, DEFAULT_SCAN_INTERVAL};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const STEP_USER: &str = "user";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl SchemaField {
    fn new(name: &str, field_type: &str, required: bool, default: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            required,
            default,
        }
    }
}

/// Fields asked for by the user step.
pub fn user_data_schema() -> Vec<SchemaField> {
    vec![
        SchemaField::new("host", "string", true, None),
        SchemaField::new("port", "integer", false, Some(json!(DEFAULT_PORT))),
        SchemaField::new(
            "scan_interval",
            "integer",
            false,
            Some(json!(DEFAULT_SCAN_INTERVAL)),
        ),
    ]
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Form {
        step_id: String,
        data_schema: Vec<SchemaField>,
        errors: BTreeMap<String, String>,
        messages: BTreeMap<String, String>,
    },
    CreateEntry {
        title: String,
        entry: ConfigEntry,
    },
}

impl FlowResult {
    pub fn form(errors: BTreeMap<String, String>) -> Self {
        let messages = errors
            .iter()
            .map(|(field, kind)| (field.clone(), SetupError::describe(kind).to_string()))
            .collect();

        FlowResult::Form {
            step_id: STEP_USER.to_string(),
            data_schema: user_data_schema(),
            errors,
            messages,
        }
    }

    pub fn form_error(kind: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert("base".to_string(), kind.to_string());
        FlowResult::form(errors)
    }
}
