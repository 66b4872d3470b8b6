//! HTTP server for tsunami hazard checks.
//!
//! Thin wrapper around the engine: request decoding, the initialization
//! gate, a per-request timeout and optional static file serving.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vigia::config::{Config, DataConfig};
use vigia::{EngineGate, HazardCheckResult, QueryError, QueryPoint};

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Tsunami hazard check server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    listen: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the three default GeoJSON layers (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory of static files served at /
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    gate: EngineGate,
    timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Vigia Hazard Server");

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data = DataConfig::in_dir(dir);
    }

    let state = Arc::new(AppState {
        timeout: Duration::from_millis(config.query.timeout_ms),
        gate: EngineGate::new(config),
    });

    // Start loading right away; early requests wait on the gate
    let init_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = init_state.gate.engine().await {
            error!("Engine initialization failed: {}", e);
        }
    });

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/check-hazard", post(check_hazard_handler));

    if let Some(dir) = &args.static_dir {
        info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct CheckHazardRequest {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn query_error(e: QueryError) -> ApiError {
    if e.is_client_error() {
        api_error(StatusCode::BAD_REQUEST, e)
    } else {
        error!("Hazard check failed: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
    }
}

/// Hazard check for one location
async fn check_hazard_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckHazardRequest>,
) -> Result<Json<HazardCheckResult>, ApiError> {
    let query = QueryPoint::new(request.lat, request.lon).map_err(query_error)?;

    let engine = state.gate.engine().await.map_err(|e| {
        error!("Engine unavailable: {}", e);
        api_error(StatusCode::SERVICE_UNAVAILABLE, "hazard engine unavailable")
    })?;

    let task = tokio::task::spawn_blocking(move || engine.evaluate(query));

    let result = match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok(result)) => result.map_err(query_error)?,
        Ok(Err(e)) => {
            error!("Hazard check task failed: {}", e);
            return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "hazard check failed"));
        }
        Err(_) => {
            warn!(
                "Hazard check at ({}, {}) timed out after {:?}",
                query.lat, query.lon, state.timeout
            );
            return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "hazard check timed out"));
        }
    };

    Ok(Json(result))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    hazard_zones: usize,
    routes: usize,
    meeting_points: usize,
}

/// Health check endpoint; does not wait for initialization
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    match state.gate.get() {
        Some(engine) => Json(HealthResponse {
            status: "ok",
            hazard_zones: engine.hazard_zones().len(),
            routes: engine.routes().len(),
            meeting_points: engine.meeting_points().len(),
        }),
        None => Json(HealthResponse {
            status: "initializing",
            hazard_zones: 0,
            routes: 0,
            meeting_points: 0,
        }),
    }
}
