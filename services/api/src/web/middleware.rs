//! services/api/src/web/middleware.rs
//!
//! Authentication and role-gating middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use firesafe_core::domain::{resolve_role, Role};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;

/// Inserted into request extensions by `require_auth` for handlers to use.
#[derive(Clone, Copy, Debug)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

fn session_id_from_headers(req: &Request) -> Option<&str> {
    let cookie_header = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
}

/// Middleware that validates the auth session cookie, resolves the caller's
/// role, and gates the route by it.
///
/// A missing or invalid session returns 401. A valid session whose role does
/// not permit the requested path is redirected to the role's home path
/// instead of erroring.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = session_id_from_headers(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let session = state.db.get_auth_session(session_id).await.map_err(|e| {
        error!("Failed to validate auth session: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let user = state.db.get_user_by_id(session.user_id).await.map_err(|e| {
        error!("Failed to load session user: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let stored_role = state
        .db
        .get_user_role(session.user_id)
        .await
        .map_err(|e| {
            error!("Failed to load user role: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?
        .map(|r| r.role);

    let role = resolve_role(
        user.email.as_deref().unwrap_or_default(),
        stored_role,
        &state.config.admin_emails,
    );

    // The capability check gates resource routes only; session endpoints
    // under /auth stay reachable for every authenticated role.
    let path = req.uri().path();
    if !path.starts_with("/auth") && !role.permits(path) {
        return Ok(Redirect::to(role.home_path()).into_response());
    }

    req.extensions_mut().insert(AuthContext {
        user_id: session.user_id,
        role,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stores::testutil::{MemoryFileStore, MockDataStore, RecordingNotifier};
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use chrono::{Duration, Utc};
    use firesafe_core::ports::DataStore;
    use tower::ServiceExt;

    fn test_config(admin_emails: Vec<String>) -> Config {
        Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://unused".to_string(),
            log_level: tracing::Level::INFO,
            storage_root: std::env::temp_dir(),
            admin_emails,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }

    async fn app_with_session(admin_emails: Vec<String>) -> (Router, String) {
        let db = Arc::new(MockDataStore::default());
        let user = db
            .create_user_with_email("tech@example.com", "hash")
            .await
            .unwrap();
        db.create_auth_session("sess-1", user.user_id, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        let state = Arc::new(AppState::new(
            db,
            Arc::new(MemoryFileStore::default()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(test_config(admin_emails)),
        ));
        let app = Router::new()
            .route("/clients", get(|| async { "clients" }))
            .route("/inspections", get(|| async { "inspections" }))
            .route("/auth/me", get(|| async { "me" }))
            .layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state);
        (app, "session=sess-1".to_string())
    }

    #[tokio::test]
    async fn tech_on_clients_is_redirected_to_inspections() {
        let (app, cookie) = app_with_session(vec![]).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/clients")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/inspections"
        );
    }

    #[tokio::test]
    async fn tech_may_reach_inspections() {
        let (app, cookie) = app_with_session(vec![]).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/inspections")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tech_can_fetch_their_own_session() {
        let (app, cookie) = app_with_session(vec![]).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn allowlisted_email_reaches_admin_routes() {
        let (app, cookie) = app_with_session(vec!["tech@example.com".to_string()]).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/clients")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let (app, _cookie) = app_with_session(vec![]).await;
        let response = app
            .oneshot(Request::builder().uri("/clients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
