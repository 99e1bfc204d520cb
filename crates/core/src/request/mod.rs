//! Inbound request validation.
//!
//! The HTTP body arrives as untyped JSON; [`validate_request`] is the only way
//! to obtain a [`TicketRequest`], so downstream stages never see a request
//! with an empty prompt or a non-integer user id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A validated ticket-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    /// Free-text description of the work, as typed or dictated by the user.
    pub prompt: String,
    /// Identifier of the submitting user.
    pub user_id: i64,
}

/// Reasons a request body is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Missing prompt")]
    MissingPrompt,

    #[error("Prompt must be a string")]
    PromptNotString,

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Missing userId")]
    MissingUserId,

    #[error("userId must be an integer")]
    UserIdNotInteger,
}

/// Validate a raw request body into a [`TicketRequest`].
pub fn validate_request(body: &Value) -> Result<TicketRequest, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

    let prompt = match object.get("prompt") {
        None | Some(Value::Null) => return Err(ValidationError::MissingPrompt),
        Some(Value::String(prompt)) => prompt,
        Some(_) => return Err(ValidationError::PromptNotString),
    };
    if prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    let user_id = match object.get("userId") {
        None | Some(Value::Null) => return Err(ValidationError::MissingUserId),
        Some(Value::Number(n)) => whole_number(n).ok_or(ValidationError::UserIdNotInteger)?,
        Some(_) => return Err(ValidationError::UserIdNotInteger),
    };

    Ok(TicketRequest {
        prompt: prompt.clone(),
        user_id,
    })
}

/// Integer value of `n`, accepting floats such as `7.0` that have no fractional part.
fn whole_number(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Shorten a prompt for log output.
pub fn prompt_preview(prompt: &str) -> String {
    const PREVIEW_CHARS: usize = 50;
    let mut preview: String = prompt.chars().take(PREVIEW_CHARS).collect();
    if prompt.chars().count() > PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}
