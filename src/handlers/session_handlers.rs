use std::net::{IpAddr, SocketAddr};

use actix_web::{HttpRequest, HttpResponse, Result, error, http, web};
use validator::Validate;

use crate::services::recorder::PageEnvironment;
use crate::state::app_state::AppState;
use crate::structs::session::{SessionResponse, VisitRequest, VisitResponse};

/// Start a browser session. The page keeps the id for the lifetime of the tab.
pub async fn open_session(app_state: web::Data<AppState>) -> HttpResponse {
    let session = app_state.sessions.open();

    HttpResponse::Created().json(SessionResponse {
        session_id: session.session_id().to_string(),
    })
}

/// Record the session's visit and start its heartbeat.
///
/// Always answers 202 for a known session; capture failures are only logged.
pub async fn record_visit(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    web::Json(body): web::Json<VisitRequest>,
) -> Result<HttpResponse> {
    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let session_id = path.into_inner();
    let session = app_state
        .sessions
        .get(&session_id)
        .ok_or_else(|| error::ErrorNotFound("Unknown session"))?;

    let user_agent = req
        .headers()
        .get(http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let environment = PageEnvironment {
        user_agent,
        path: body.path,
        referrer: body.referrer,
        language: body.language,
        screen_size: body.screen_size,
    };

    let client_ip = client_ip(&req);
    let recorded = app_state
        .recorder
        .record_visit(&session, environment, &body.location, client_ip.as_deref())
        .await;

    if recorded.is_some() {
        app_state.heartbeat.spawn(&app_state.sessions, session.clone());
    }

    Ok(HttpResponse::Accepted().json(VisitResponse {
        logged: session.is_logged(),
        visit_id: session.visit_id().map(String::from),
    }))
}

/// Tab closed: stop the heartbeat and forget the session
pub async fn close_session(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    if app_state.sessions.close(&path.into_inner()) {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::NotFound().json(serde_json::json!({ "error": "Unknown session" }))
    }
}

/// Visitor address without a port, honouring forwarding headers
fn client_ip(req: &HttpRequest) -> Option<String> {
    let info = req.connection_info();
    let raw = info.realip_remote_addr()?;

    raw.parse::<IpAddr>()
        .or_else(|_| raw.parse::<SocketAddr>().map(|addr| addr.ip()))
        .ok()
        .map(|ip| ip.to_string())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};

    use super::*;
    use crate::db::DocumentStore;
    use crate::models::visit::LocationMethod;
    use crate::routes::init_routes;
    use crate::test_support::test_state;

    #[actix_web::test]
    async fn visit_is_recorded_once_per_session() {
        let (state, store) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;

        let opened: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/api/sessions").to_request(),
        )
        .await;
        let session_id = opened["session_id"].as_str().unwrap().to_string();

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri(&format!("/api/sessions/{}/visit", session_id))
                .insert_header((http::header::USER_AGENT, "Mozilla/5.0 (Linux; Android 14)"))
                .peer_addr("49.37.1.1:40000".parse().unwrap())
                .set_json(serde_json::json!({
                    "path": "/",
                    "referrer": "https://www.linkedin.com/",
                    "language": "en-IN",
                    "screen_size": "412x915",
                    "location": { "status": "granted", "lat": 10.8, "lng": 78.7 }
                }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), http::StatusCode::ACCEPTED);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["logged"], true);
        }

        let visits = store.list_visits().await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].method, LocationMethod::Gps);
        assert_eq!(visits[0].city, "Tiruchirappalli");
        assert_eq!(visits[0].user_agent, "Mozilla/5.0 (Linux; Android 14)");

        let close = test::TestRequest::delete()
            .uri(&format!("/api/sessions/{}", session_id))
            .to_request();
        assert_eq!(
            test::call_service(&app, close).await.status(),
            http::StatusCode::NO_CONTENT
        );
    }

    #[actix_web::test]
    async fn unknown_session_is_not_found() {
        let (state, _store) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/sessions/missing/visit")
            .set_json(serde_json::json!({ "path": "/" }))
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            http::StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn strips_port_from_peer_address() {
        let req = test::TestRequest::default()
            .peer_addr("203.0.113.9:5555".parse().unwrap())
            .to_http_request();

        assert_eq!(client_ip(&req).as_deref(), Some("203.0.113.9"));
    }
}
