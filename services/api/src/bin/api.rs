//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FsFileStore, TracingNotifier},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, me_handler, signup_handler},
        middleware::require_auth,
        reports::{inspection_report_handler, renewal_notice_handler},
        rest::{
            audit_report_handler, create_client_handler, create_inspection_handler,
            delete_client_handler, delete_inspection_handler, delete_user_handler,
            get_company_handler, list_clients_handler, list_inspections_handler,
            list_team_handler, set_role_handler, update_client_handler,
            update_company_handler, update_inspection_handler, upcoming_renewals_handler,
            upload_logo_handler,
        },
        state::AppState,
        ApiDoc,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Adapters & Shared AppState ---
    let file_store = Arc::new(FsFileStore::new(config.storage_root.clone()));
    let notifier = Arc::new(TracingNotifier);
    let app_state = Arc::new(AppState::new(
        db_adapter,
        file_store,
        notifier,
        config.clone(),
    ));

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth + role gate)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route(
            "/clients",
            get(list_clients_handler).post(create_client_handler),
        )
        .route(
            "/clients/{id}",
            put(update_client_handler).delete(delete_client_handler),
        )
        .route("/clients/{id}/renewal-notice", get(renewal_notice_handler))
        .route(
            "/inspections",
            get(list_inspections_handler).post(create_inspection_handler),
        )
        .route(
            "/inspections/{id}",
            put(update_inspection_handler).delete(delete_inspection_handler),
        )
        .route("/inspections/{id}/report", get(inspection_report_handler))
        .route(
            "/company",
            get(get_company_handler).put(update_company_handler),
        )
        .route("/company/logo", post(upload_logo_handler))
        .route("/users", get(list_team_handler))
        .route("/users/{id}", axum::routing::delete(delete_user_handler))
        .route("/users/{id}/role", put(set_role_handler))
        .route("/dashboard/renewals", get(upcoming_renewals_handler))
        .route("/dashboard/audit", get(audit_report_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
