use actix_web::{HttpResponse, Result, error, web};
use chrono::Local;

use crate::analytics::DashboardSummary;
use crate::state::app_state::AppState;
use crate::structs::dashboard::DashboardParams;

/// Full read of both collections, aggregated in one pass for the admin view
pub async fn get_dashboard(
    app_state: web::Data<AppState>,
    query: web::Query<DashboardParams>,
) -> Result<HttpResponse> {
    let visits = app_state
        .store
        .list_visits()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;
    let leads = app_state
        .store
        .list_leads()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let summary = DashboardSummary::build(
        &visits,
        leads,
        Local::now().date_naive(),
        query.days(),
        query.limit(),
    );

    Ok(HttpResponse::Ok().json(summary))
}
