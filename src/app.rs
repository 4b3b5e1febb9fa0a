use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::{ReportingConfig, ServerConfig};
use crate::export;
use crate::grid::MetricGrid;
use crate::login::{self, AuthUser, UserStore};
use crate::metrics::{MetricStore, YearlyMetricInput};

/// Shared application state
pub struct AppState {
    /// Registered users
    pub users: UserStore,

    /// Metric records
    pub metrics: MetricStore,

    /// Reporting years and benchmarks
    pub reporting: ReportingConfig,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

/// Start the web server
///
/// Opens the document stores under the configured data directory, builds the
/// router, and serves until the process is stopped.
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let users = UserStore::open(config.data_dir.join("users.json"))?;
    let metrics = MetricStore::open(config.data_dir.join("metrics.json"))?;

    let state = Arc::new(AppState {
        users,
        metrics,
        reporting: config.reporting,
    });

    let metric_routes = Router::new()
        .route("/create", post(create_metrics))
        .route("/get", get(get_metrics))
        .route("/export", get(export_metrics))
        .route_layer(middleware::from_fn(login::require_auth));

    let app = Router::new()
        .route("/api/users/register", post(login::handle_register))
        .route("/api/users/login", post(login::handle_login))
        .nest("/api/metrics", metric_routes)
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    log::info!("Server is running on port {}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle a batch metric submission
///
/// The body must be a JSON array of yearly inputs. The whole batch is
/// reconciled all-or-nothing: the response is 201 with every resulting
/// record, or a single error with nothing written.
async fn create_metrics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !body.is_array() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid data format. Expected an array of metrics" })),
        )
            .into_response();
    }

    let submissions: Vec<YearlyMetricInput> = match serde_json::from_value(body) {
        Ok(submissions) => submissions,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid data format. Expected an array of metrics" })),
            )
                .into_response();
        }
    };

    match state.metrics.reconcile(&user.id, &submissions) {
        Ok(records) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Metrics processed successfully",
                "metrics": records,
            })),
        )
            .into_response(),
        Err(message) => {
            log::warn!("Metric submission failed for user {}: {}", user.id, message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": message })),
            )
                .into_response()
        }
    }
}

/// Return all metric records owned by the caller
async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match state.metrics.list(&user.id) {
        Ok(records) => (StatusCode::OK, Json(json!({ "metrics": records }))).into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": message })),
        )
            .into_response(),
    }
}

/// Export the caller's dense series as a downloadable file
///
/// `?format=xlsx` returns a spreadsheet; anything else returns pretty JSON.
/// The caller's records are loaded into a grid first so the export sees the
/// same dense shaping the charts use.
async fn export_metrics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let records = match state.metrics.list(&user.id) {
        Ok(records) => records,
        Err(message) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": message })),
            )
                .into_response();
        }
    };

    let mut grid = MetricGrid::new(&state.reporting.years);
    grid.load_records(&records);
    let series = grid.dense_series();

    match query.format.as_deref().unwrap_or("json") {
        "xlsx" => match export::to_xlsx(&series) {
            Ok(buffer) => Response::builder()
                .status(StatusCode::OK)
                .header(
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                )
                .header(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"sustainability_metrics.xlsx\"",
                )
                .body(axum::body::Body::from(Bytes::from(buffer)))
                .unwrap(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": e.to_string() })),
            )
                .into_response(),
        },
        _ => match export::to_json(&series) {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"sustainability_metrics.json\"",
                )
                .body(axum::body::Body::from(body))
                .unwrap(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": e.to_string() })),
            )
                .into_response(),
        },
    }
}
