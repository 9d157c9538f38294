//! JSON HTTP API over the search service

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::export::ExportFormat;
use crate::models::{SearchRecord, SearchRequest, SearchUpdate};
use crate::service::{DEFAULT_PAGE_LIMIT, Page, SearchService};
use crate::{JournalError, VERSION};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
}

pub fn router(service: Arc<SearchService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/weather", get(list_searches).post(create_search))
        .route("/weather/export", get(export_searches))
        .route(
            "/weather/{id}",
            get(get_search).put(update_search).delete(delete_search),
        )
        .with_state(AppState { service })
}

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl JournalError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            JournalError::LocationNotFound { .. } | JournalError::RecordNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            JournalError::InvalidDateRange { .. } | JournalError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            JournalError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            JournalError::EmptyRange => StatusCode::UNPROCESSABLE_ENTITY,
            JournalError::Config { .. } | JournalError::Storage { .. } | JournalError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }

        let body = ErrorBody {
            kind: self.kind().to_string(),
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for JournalError {
    fn from(rejection: JsonRejection) -> Self {
        JournalError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for JournalError {
    fn from(rejection: PathRejection) -> Self {
        JournalError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for JournalError {
    fn from(rejection: QueryRejection) -> Self {
        JournalError::validation(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, JournalError>;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn create_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SearchRecord>)> {
    let Json(request) = payload?;
    let record = state.service.create(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    skip: Option<usize>,
    limit: Option<usize>,
}

async fn list_searches(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SearchRecord>>> {
    let Query(params) = params?;
    let page = Page {
        skip: params.skip.unwrap_or(0),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    };
    Ok(Json(state.service.list(page).await?))
}

async fn get_search(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<SearchRecord>> {
    let Path(id) = id?;
    Ok(Json(state.service.get(id).await?))
}

async fn update_search(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<SearchUpdate>, JsonRejection>,
) -> ApiResult<Json<SearchRecord>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    Ok(Json(state.service.update(id, update).await?))
}

#[derive(Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

async fn delete_search(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let Path(id) = id?;
    state.service.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: format!("Search record {id} deleted successfully."),
    }))
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    format: Option<String>,
}

async fn export_searches(
    State(state): State<AppState>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let format: ExportFormat = params.format.as_deref().unwrap_or("json").parse()?;
    let body = state.service.export(format).await?;

    let disposition = format!(
        "attachment; filename=\"weather_searches.{}\"",
        format.file_extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
