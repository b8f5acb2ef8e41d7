use actix_web::web;

use crate::handlers::auth_handlers::{create_superuser, login};
use crate::handlers::dashboard_handlers::get_dashboard;
use crate::handlers::health_handlers::health_check;
use crate::handlers::lead_handlers::capture_lead;
use crate::handlers::session_handlers::{close_session, open_session, record_visit};
use crate::middlewares::authmw::JwtAuth;

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Authentication routes - no auth required
    cfg.service(
        web::scope("/api/auth")
            .route("/login", web::post().to(login))
            .route("/init", web::post().to(create_superuser)),
    );
    // Visitor-facing capture routes - called by the portfolio page itself
    cfg.service(
        web::scope("/api/sessions")
            .route("", web::post().to(open_session))
            .route("/{session_id}/visit", web::post().to(record_visit))
            .route("/{session_id}", web::delete().to(close_session)),
    );
    cfg.route("/api/leads", web::post().to(capture_lead));
    cfg.route("/api/health/check", web::get().to(health_check));
    // Admin dashboard - requires authentication
    cfg.service(
        web::scope("/api/dashboard")
            .wrap(JwtAuth)
            .route("", web::get().to(get_dashboard)),
    );
}
