pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod health_handlers;
pub mod lead_handlers;
pub mod session_handlers;
