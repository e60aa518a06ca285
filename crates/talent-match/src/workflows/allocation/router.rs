use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::batch::{BatchError, BatchId};
use super::domain::{CandidateId, Role, RoleId};
use super::repository::{AllocationRepository, EventPublisher};
use super::service::{
    AllocationService, AllocationServiceError, ApprovalRequest, MatchView, RejectionRequest,
};

/// Router builder exposing scoring, batching, and reservation endpoints.
pub fn allocation_router<R, P>(service: Arc<AllocationService<R, P>>) -> Router
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/matches/score", post(score_handler::<R, P>))
        .route(
            "/api/v1/roles/:role_id/matches",
            get(role_matches_handler::<R, P>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/matches",
            get(candidate_matches_handler::<R, P>),
        )
        .route("/api/v1/roles", post(register_role_handler::<R, P>))
        .route("/api/v1/batches", post(create_batch_handler::<R, P>))
        .route(
            "/api/v1/batches/:batch_id/send",
            post(send_batch_handler::<R, P>),
        )
        .route(
            "/api/v1/batches/:batch_id/export",
            get(export_batch_handler::<R, P>),
        )
        .route("/api/v1/approvals/queue", get(approval_queue_handler::<R, P>))
        .route(
            "/api/v1/reservations",
            post(approve_handler::<R, P>).get(reservations_handler::<R, P>),
        )
        .route(
            "/api/v1/reservations/:candidate_id/:role_id",
            delete(release_handler::<R, P>),
        )
        .route("/api/v1/rejections", post(reject_handler::<R, P>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) candidate_id: CandidateId,
    pub(crate) role_id: RoleId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchRequest {
    #[serde(default)]
    pub(crate) view: MatchView,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueQuery {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn error_response(error: AllocationServiceError) -> Response {
    let status = match &error {
        AllocationServiceError::CandidateNotFound(_)
        | AllocationServiceError::RoleNotFound(_)
        | AllocationServiceError::Batch(BatchError::NotFound(_)) => StatusCode::NOT_FOUND,
        AllocationServiceError::Conflict(conflict) => {
            let payload = json!({
                "error": conflict.to_string(),
                "candidate_id": conflict.candidate_id,
                "existing_role_id": conflict.existing_role_id,
                "requested_role_id": conflict.requested_role_id,
            });
            return (StatusCode::CONFLICT, axum::Json(payload)).into_response();
        }
        AllocationServiceError::RoleConfiguration(_) | AllocationServiceError::InvalidRating(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AllocationServiceError::Export(_)
        | AllocationServiceError::Repository(_)
        | AllocationServiceError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn score_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.score(&request.candidate_id, &request.role_id) {
        Ok(score) => (StatusCode::OK, axum::Json(score)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn role_matches_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    Path(role_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.top_matches_for_role(&RoleId(role_id), query.limit) {
        Ok(matches) => (StatusCode::OK, axum::Json(matches)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn candidate_matches_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    Path(candidate_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.top_matches_for_candidate(&CandidateId(candidate_id), query.limit) {
        Ok(matches) => (StatusCode::OK, axum::Json(matches)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_role_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    axum::Json(role): axum::Json<Role>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.register_role(role) {
        Ok(role) => (StatusCode::CREATED, axum::Json(role)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_batch_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    axum::Json(request): axum::Json<BatchRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.generate_batch(request.view) {
        Ok(batch) => (StatusCode::CREATED, axum::Json(batch)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn send_batch_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    Path(batch_id): Path<String>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.send_batch(&BatchId(batch_id)) {
        Ok(batch) => (StatusCode::OK, axum::Json(batch)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_batch_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    Path(batch_id): Path<String>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    let mut body = Vec::new();
    match service.export_batch(&BatchId(batch_id), &mut body) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approval_queue_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    Query(query): Query<QueueQuery>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    match service.approval_queue(today) {
        Ok(queue) => (StatusCode::OK, axum::Json(queue)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    axum::Json(request): axum::Json<ApprovalRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.approve(request) {
        Ok(reservation) => (StatusCode::CREATED, axum::Json(reservation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reservations_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    (StatusCode::OK, axum::Json(service.reservations())).into_response()
}

pub(crate) async fn release_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    Path((candidate_id, role_id)): Path<(String, String)>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.release(&CandidateId(candidate_id), &RoleId(role_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<R, P>(
    State(service): State<Arc<AllocationService<R, P>>>,
    axum::Json(request): axum::Json<RejectionRequest>,
) -> Response
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    match service.reject(request) {
        Ok(rejection) => (StatusCode::CREATED, axum::Json(rejection)).into_response(),
        Err(error) => error_response(error),
    }
}
