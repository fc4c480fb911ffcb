//! API handlers for the Lakegate server.
//!
//! Every handler opens its own lake connection on a blocking thread and
//! releases it before returning, on success and on failure alike.

use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lakegate_db::{paginate, with_connection, DbError, LakeSettings, Pagination};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

/// Query string for `GET /query-ducklake`.
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// SQL text to execute. Required.
    pub query: Option<String>,
    /// Page size, `1..=1000`, default 100.
    pub limit: Option<i64>,
    /// Rows to skip, `>= 0`, default 0.
    pub offset: Option<i64>,
}

/// Response body for `GET /query-ducklake`.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Result rows, each an array of column values.
    pub data: Vec<Vec<JsonValue>>,
    /// The statement that was executed, pagination clause included.
    pub query: String,
    /// Number of rows in `data`.
    pub row_count: usize,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 UTC timestamp of the check.
    pub timestamp: String,
    pub database: String,
    /// `attached` when the lake catalog is in use, `fallback` otherwise.
    pub catalog: String,
}

/// Response body for `GET /tables`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Maps a database failure to a 500, keeping the engine's message intact.
fn db_failure(e: DbError) -> ApiError {
    if e.is_connection_failure() {
        ApiError::InternalServerError(format!("Database connection failed: {}", e))
    } else {
        ApiError::InternalServerError(e.to_string())
    }
}

/// Runs `f` against a fresh connection on the blocking pool.
async fn run_blocking<T, F>(lake: &LakeSettings, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&lakegate_db::LakeConnection) -> Result<T, DbError> + Send + 'static,
{
    let lake = lake.clone();
    tokio::task::spawn_blocking(move || with_connection(&lake, f))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
        .map_err(db_failure)
}

/// Handler for `GET /query-ducklake`.
///
/// Appends `LIMIT`/`OFFSET` to the caller's SQL and runs it unmodified. There
/// is no authentication and no statement filtering: anything the engine
/// accepts, including writes, is executed.
pub async fn query_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let query = params
        .query
        .ok_or_else(|| ApiError::BadRequest("missing required parameter: query".to_string()))?;
    let page = Pagination::new(params.limit, params.offset)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let full_query = paginate(&query, page);

    let outcome = run_blocking(&state.lake, move |conn| conn.execute_query(&full_query))
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "gateway query failed"))?;

    tracing::info!(
        query = %outcome.query,
        rows = outcome.row_count(),
        "executed gateway query"
    );

    Ok(Json(QueryResponse {
        row_count: outcome.row_count(),
        data: outcome.rows,
        query: outcome.query,
    }))
}

/// Handler for `GET /health`.
///
/// Healthy whenever the base database opens, whether or not the catalog
/// could be attached.
pub async fn health_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let mode = run_blocking(&state.lake, |conn| {
        conn.ping()?;
        Ok(conn.mode())
    })
    .await
    .map_err(|e| {
        let detail = match e {
            ApiError::BadRequest(msg) | ApiError::InternalServerError(msg) => msg,
        };
        ApiError::InternalServerError(format!("Database health check failed: {}", detail))
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        database: "connected".to_string(),
        catalog: mode.as_str().to_string(),
    }))
}

/// Handler for `GET /tables`.
pub async fn tables_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<TablesResponse>, ApiError> {
    let tables = run_blocking(&state.lake, |conn| conn.list_tables()).await?;
    Ok(Json(TablesResponse { tables }))
}
