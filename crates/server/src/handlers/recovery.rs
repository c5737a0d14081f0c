//! Handlers for the recovery endpoints.
use super::{authenticate_owner, ApiMessage};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use svr_core::{
    crypto::RecoveryShardPayload, GuardianId, GuardianStatus,
    RecoveryRequestId, RequestStatus, UtcDateTime,
};
use svr_database::entity::{GuardianRecord, RecoveryRequestRecord};
use svr_recovery::RecoveryService;

/// Body returned for every recovery request, match or not.
const REQUEST_ACCEPTED: &str =
    "if the account exists a notification has been sent";

/// Body returned when a cancel link did not match a pending request.
const CANCEL_REJECTED: &str = "link is invalid or already used";

/// Service extension for the handlers.
pub(crate) type Service = Extension<Arc<RecoveryService>>;

#[derive(Debug, Deserialize)]
pub(crate) struct RecoverRequestBody {
    email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelQuery {
    token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InviteGuardianBody {
    email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuardianBody {
    #[serde(rename = "guardianId")]
    guardian_id: GuardianId,
    email: String,
    status: GuardianStatus,
    #[serde(rename = "createdAt")]
    created_at: UtcDateTime,
}

impl From<GuardianRecord> for GuardianBody {
    fn from(value: GuardianRecord) -> Self {
        Self {
            guardian_id: value.guardian_id,
            email: value.email,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RecoveryRequestBody {
    #[serde(rename = "requestId")]
    request_id: RecoveryRequestId,
    #[serde(rename = "requestedAt")]
    requested_at: UtcDateTime,
    #[serde(rename = "timelockUntil")]
    timelock_until: UtcDateTime,
    status: RequestStatus,
}

impl From<RecoveryRequestRecord> for RecoveryRequestBody {
    fn from(value: RecoveryRequestRecord) -> Self {
        Self {
            request_id: value.request_id,
            requested_at: value.requested_at,
            timelock_until: value.timelock_until,
            status: value.status,
        }
    }
}

/// Map a service error onto an HTTP response.
fn error_response(error: svr_recovery::Error) -> Response {
    use svr_recovery::Error;
    match &error {
        Error::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        Error::NotFoundOrAlreadyUsed => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::fail(error.to_string())),
        )
            .into_response(),
        Error::GuardianNotFound(_)
        | Error::GuardianAlreadyInvited(_)
        | Error::DuplicateGuardian(_)
        | Error::ShardCount(_)
        | Error::Core(_) => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::fail(error.to_string())),
        )
            .into_response(),
        _ => {
            tracing::error!(%error, "handler");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Open a recovery request against an email address.
///
/// Anti-enumeration surface: the response is byte-identical whether
/// the email matched an account, matched nothing, or the request
/// failed internally.
#[utoipa::path(
    post,
    path = "/recover/request",
    responses(
        (
            status = StatusCode::OK,
            description = "Request accepted.",
        ),
    ),
)]
pub(crate) async fn request_recovery(
    Extension(service): Service,
    Json(body): Json<RecoverRequestBody>,
) -> impl IntoResponse {
    if let Err(error) = service.request_recovery(&body.email).await {
        tracing::error!(%error, "recover::request");
    }
    (StatusCode::OK, Json(ApiMessage::ok(REQUEST_ACCEPTED)))
}

/// Cancel a recovery request with a veto token.
///
/// Unauthenticated; the one-time token in the link is the
/// authorization. Every failure cause yields the same response.
#[utoipa::path(
    get,
    path = "/recover/cancel",
    responses(
        (
            status = StatusCode::OK,
            description = "Cancel outcome.",
        ),
    ),
)]
pub(crate) async fn cancel_by_token(
    Extension(service): Service,
    Query(query): Query<CancelQuery>,
) -> impl IntoResponse {
    match service.cancel_by_token(&query.token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiMessage::ok("recovery request cancelled")),
        ),
        Err(error) => {
            if !matches!(
                error,
                svr_recovery::Error::NotFoundOrAlreadyUsed
            ) {
                tracing::error!(%error, "recover::cancel_by_token");
            }
            (StatusCode::OK, Json(ApiMessage::fail(CANCEL_REJECTED)))
        }
    }
}

/// Cancel a recovery request from an authenticated session.
#[utoipa::path(
    post,
    path = "/recover/cancel/{request_id}",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::NOT_FOUND,
            description = "No pending request with this identifier.",
        ),
        (
            status = StatusCode::OK,
            description = "Request cancelled.",
        ),
    ),
)]
pub(crate) async fn cancel_request(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Path(request_id): Path<RecoveryRequestId>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => {
            match service.cancel_request(owner_id, request_id).await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(ApiMessage::ok("recovery request cancelled")),
                )
                    .into_response(),
                Err(error) => error_response(error),
            }
        }
        Err(status) => status.into_response(),
    }
}

/// Store both encrypted guardian shards for the caller.
#[utoipa::path(
    put,
    path = "/recover/shards",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::BAD_REQUEST,
            description = "Payload named an unknown guardian or the wrong number of shards.",
        ),
        (
            status = StatusCode::OK,
            description = "Shards stored.",
        ),
    ),
)]
pub(crate) async fn save_shards(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(shards): Json<Vec<RecoveryShardPayload>>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => {
            match service.save_shards(owner_id, shards).await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(ApiMessage::ok("recovery kit stored")),
                )
                    .into_response(),
                Err(error) => error_response(error),
            }
        }
        Err(status) => status.into_response(),
    }
}

/// Recovery state of the caller's account.
#[utoipa::path(
    get,
    path = "/recover/status",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::OK,
            description = "Recovery status.",
        ),
    ),
)]
pub(crate) async fn recovery_status(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => match service.recovery_status(owner_id).await {
            Ok(status) => Json(status).into_response(),
            Err(error) => error_response(error),
        },
        Err(status) => status.into_response(),
    }
}

/// List the caller's pending recovery requests.
#[utoipa::path(
    get,
    path = "/recover/requests",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::OK,
            description = "Pending requests.",
        ),
    ),
)]
pub(crate) async fn pending_requests(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => match service.pending_requests(owner_id).await {
            Ok(requests) => Json(
                requests
                    .into_iter()
                    .map(RecoveryRequestBody::from)
                    .collect::<Vec<_>>(),
            )
            .into_response(),
            Err(error) => error_response(error),
        },
        Err(status) => status.into_response(),
    }
}

/// Invite a guardian for the caller.
#[utoipa::path(
    post,
    path = "/recover/guardians",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::BAD_REQUEST,
            description = "Guardian already invited.",
        ),
        (
            status = StatusCode::OK,
            description = "Guardian invited.",
        ),
    ),
)]
pub(crate) async fn invite_guardian(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<InviteGuardianBody>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => {
            match service.invite_guardian(owner_id, &body.email).await {
                Ok(record) => {
                    Json(GuardianBody::from(record)).into_response()
                }
                Err(error) => error_response(error),
            }
        }
        Err(status) => status.into_response(),
    }
}

/// List the caller's guardians.
#[utoipa::path(
    get,
    path = "/recover/guardians",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::OK,
            description = "Guardian list.",
        ),
    ),
)]
pub(crate) async fn list_guardians(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => match service.list_guardians(owner_id).await {
            Ok(records) => Json(
                records
                    .into_iter()
                    .map(GuardianBody::from)
                    .collect::<Vec<_>>(),
            )
            .into_response(),
            Err(error) => error_response(error),
        },
        Err(status) => status.into_response(),
    }
}

/// Mark a guardian invitation as accepted.
#[utoipa::path(
    post,
    path = "/recover/guardians/{guardian_id}/accept",
    security(("bearer_token" = [])),
    responses(
        (
            status = StatusCode::UNAUTHORIZED,
            description = "Authorization failed.",
        ),
        (
            status = StatusCode::BAD_REQUEST,
            description = "No guardian with this identifier.",
        ),
        (
            status = StatusCode::OK,
            description = "Guardian accepted.",
        ),
    ),
)]
pub(crate) async fn accept_guardian(
    Extension(service): Service,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Path(guardian_id): Path<GuardianId>,
) -> impl IntoResponse {
    match authenticate_owner(&bearer) {
        Ok(owner_id) => {
            match service.accept_guardian(owner_id, guardian_id).await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(ApiMessage::ok("guardian accepted")),
                )
                    .into_response(),
                Err(error) => error_response(error),
            }
        }
        Err(status) => status.into_response(),
    }
}
