//! `POST /api/ai-ticket`: prompt in, Shortcut story out.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use ticketsmith_core::{
    PipelineError, PipelineOutcome, PipelineSuccess, TicketResponse, ValidationError,
};

use crate::metrics::record_pipeline_outcome;
use crate::state::AppState;

const SUCCESS_MESSAGE: &str = "AI ticket created successfully.";

pub async fn create_ai_ticket(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<TicketResponse>) {
    let result = run_pipeline(&state, body).await;

    record_pipeline_outcome(match &result {
        Ok(_) => PipelineOutcome::Success,
        Err(e) => e.outcome(),
    });

    match result {
        Ok(success) => (
            StatusCode::CREATED,
            Json(TicketResponse::Success {
                shortcut_story_id: success.ticket.external_id,
                message: SUCCESS_MESSAGE.to_string(),
            }),
        ),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(TicketResponse::Error {
                    message: e.client_message(),
                }),
            )
        }
    }
}

/// Configuration is checked before the body so a misconfigured server
/// reports that first.
async fn run_pipeline(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<PipelineSuccess, PipelineError> {
    let pipeline = state
        .pipeline()
        .inspect_err(|e| error!(error = %e, "Ticket pipeline unavailable"))?;

    let Json(body) = body.map_err(|rejection| {
        let e = ValidationError::MalformedBody(rejection.body_text());
        error!(error = %e, "Rejected ticket request");
        e
    })?;

    pipeline.run(&body).await
}
