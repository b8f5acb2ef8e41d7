use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use crate::models::lead::{DEFAULT_LEAD_SOURCE, LeadStatus};
use crate::state::app_state::AppState;
use crate::structs::lead::{LeadAction, LeadRequest, LeadResponse};

/// Save a draft (blur/close) or a sent message from the engagement prompt
pub async fn capture_lead(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<LeadRequest>,
) -> Result<HttpResponse> {
    if let Err(errors) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    // Nothing typed, nothing to keep
    if req.message.trim().is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }

    let session = req
        .session_id
        .as_deref()
        .and_then(|id| app_state.sessions.get(id));
    let status = match req.action {
        LeadAction::Draft => LeadStatus::Draft,
        LeadAction::Send => LeadStatus::Sent,
    };
    let source = req
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LEAD_SOURCE);

    let saved = app_state
        .leads
        .save(session.as_deref(), &req.message, status, source)
        .await;

    let handoff_url = match status {
        LeadStatus::Sent => Some(app_state.leads.handoff_url(&req.message)),
        LeadStatus::Draft => None,
    };

    Ok(HttpResponse::Accepted().json(LeadResponse {
        saved: saved.is_some(),
        handoff_url,
    }))
}
