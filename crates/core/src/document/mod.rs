//! The structured ticket document produced by the generative step.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Field names as they appear on the wire, in canonical order.
pub const DOCUMENT_FIELDS: [&str; 5] = [
    "objective",
    "background",
    "scopeOfWork",
    "technicalRequirements",
    "testingRequirements",
];

/// A fully populated ticket document.
///
/// Only [`parse_document`] produces one from model output, and it rejects
/// partial documents, so every field is a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDocument {
    pub objective: String,
    pub background: String,
    pub scope_of_work: String,
    pub technical_requirements: String,
    pub testing_requirements: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {0} is not a string")]
    FieldNotString(&'static str),

    #[error("Field {0} is empty")]
    EmptyField(&'static str),
}

/// Parse model output text into a [`StructuredDocument`].
pub fn parse_document(text: &str) -> Result<StructuredDocument, DocumentError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(DocumentError::NotAnObject)?;

    let [objective, background, scope_of_work, technical_requirements, testing_requirements] =
        DOCUMENT_FIELDS;

    Ok(StructuredDocument {
        objective: required_string(object, objective)?,
        background: required_string(object, background)?,
        scope_of_work: required_string(object, scope_of_work)?,
        technical_requirements: required_string(object, technical_requirements)?,
        testing_requirements: required_string(object, testing_requirements)?,
    })
}

fn required_string(object: &Map<String, Value>, field: &'static str) -> Result<String, DocumentError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(DocumentError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(DocumentError::EmptyField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DocumentError::FieldNotString(field)),
    }
}

/// Response schema handed to the model: an object with exactly the five
/// document fields, all strings, all required.
pub fn document_schema() -> Value {
    let properties: Map<String, Value> = DOCUMENT_FIELDS
        .iter()
        .map(|field| (field.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": DOCUMENT_FIELDS,
    })
}
