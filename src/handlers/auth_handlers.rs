use actix_web::{HttpResponse, Result, error, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use log::{info, warn};
use validator::Validate;

use crate::models::admin::AdminUser;
use crate::state::app_state::AppState;
use crate::structs::auth::{LoginRequest, LoginResponse};
use crate::utils::jwt::create_token;

fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": "Invalid email or password"
    }))
}

pub async fn login(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    if let Err(errors) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let email = req.email.trim().to_lowercase();
    let admin = app_state
        .store
        .find_admin(&email)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let Some(admin) = admin else {
        warn!("Login attempt for unknown admin {}", email);
        return Ok(invalid_credentials());
    };

    let password_matches = verify(&req.password, &admin.password_hash)
        .map_err(|_| error::ErrorInternalServerError("Password verification failed"))?;
    if !password_matches {
        warn!("Wrong password for admin {}", email);
        return Ok(invalid_credentials());
    }

    let token = create_token(&admin.email, &app_state.config.jwt_secret)
        .map_err(|e| error::ErrorInternalServerError(format!("Token generation failed: {}", e)))?;

    app_state
        .store
        .record_admin_login(&admin.email, chrono::Utc::now().timestamp_millis())
        .await
        .map_err(|e| {
            error::ErrorInternalServerError(format!("Failed to update last login: {}", e))
        })?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        email: admin.email,
    }))
}

// First dashboard account, only while none exists
pub async fn create_superuser(app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let count = app_state
        .store
        .count_admins()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    if count > 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Admins already exist, cannot create initial superuser"
        })));
    }

    let email = std::env::var("SUPERUSER_EMAIL")
        .map_err(|_| error::ErrorInternalServerError("SUPERUSER_EMAIL not set"))?;
    let password = std::env::var("SUPERUSER_PASSWORD")
        .map_err(|_| error::ErrorInternalServerError("SUPERUSER_PASSWORD not set"))?;

    let password_hash = hash(password, DEFAULT_COST)
        .map_err(|e| error::ErrorInternalServerError(format!("Failed to hash password: {}", e)))?;

    let email = email.trim().to_lowercase();
    app_state
        .store
        .insert_admin(AdminUser::new(email.clone(), password_hash))
        .await
        .map_err(|e| {
            error::ErrorInternalServerError(format!("Failed to create superuser: {}", e))
        })?;
    info!("Created initial admin {}", email);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Superuser created successfully",
        "email": email
    })))
}
