use actix_web::{HttpResponse, web};
use log::error;

use crate::state::app_state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "store": state.store.backend_name(),
            "active_sessions": state.sessions.len(),
        })),
        Err(e) => {
            error!("Health check failed: {:#}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "store": state.store.backend_name(),
                "error": "Database connection failed"
            }))
        }
    }
}
