//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderValue,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::decompose::{DecompositionResult, DecompositionService, LlmGateway};
use crate::llm::{GroqClient, LlmClient};
use crate::store::{create_store, Store};

use super::error::ApiError;
use super::types::*;

/// Shared application state.
pub struct AppState {
    pub service: DecompositionService,
}

/// Build the router with the single trusted origin allowed through CORS.
///
/// Requests from any other origin get no `Access-Control-Allow-Origin` header.
pub fn build_router(state: Arc<AppState>, cors_origin: HeaderValue) -> Router {
    // Credentials cannot be combined with wildcards, so methods and headers mirror the request.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([cors_origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(health))
        .route("/register", post(register_user))
        .route("/user", get(get_user))
        .route("/decompose-task", post(decompose_task))
        .route("/task-history", get(task_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = create_store(config.store_type, config.database_path.clone()).await?;

    let client: Arc<dyn LlmClient> = Arc::new(GroqClient::with_endpoint(
        config.api_key.clone(),
        config.api_url.clone(),
        config.llm_timeout,
    ));
    let gateway =
        LlmGateway::new(client, config.model.clone()).with_temperature(config.temperature);

    let state = Arc::new(AppState {
        service: DecompositionService::new(Arc::clone(&store), gateway),
    });
    let app = build_router(state, config.cors_origin.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_store(store.as_ref()).await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

async fn close_store(store: &dyn Store) {
    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close store cleanly: {}", e);
    }
}

/// Wait for SIGTERM/SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}

/// Health check endpoint.
async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::new("backend running"))
}

/// Register a new user.
async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    state.service.register(req.into()).await?;
    Ok(Json(StatusResponse::new("registered")))
}

/// Get a stored user profile.
async fn get_user(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Query(query) = query?;
    let profile = state.service.profile(&query.email).await?;
    Ok(Json(profile.into()))
}

/// Decompose a task for a registered user.
async fn decompose_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DecomposeRequest>, JsonRejection>,
) -> Result<Json<DecompositionResult>, ApiError> {
    let Json(req) = payload?;
    let result = state.service.decompose(&req.email, &req.task).await?;
    Ok(Json(result))
}

/// List recent decompositions, most recent first.
async fn task_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let Query(query) = query?;
    let records = state.service.history(&query.email, query.limit).await?;
    Ok(Json(records.into_iter().map(HistoryEntry::from).collect()))
}
