//! OpenAPI definition for the recovery endpoints.
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sovereign Recovery",
        description = "Guardian-mediated account recovery protocol.",
    ),
    paths(
        crate::server::openapi,
        crate::handlers::recovery::request_recovery,
        crate::handlers::recovery::cancel_by_token,
        crate::handlers::recovery::cancel_request,
        crate::handlers::recovery::save_shards,
        crate::handlers::recovery::recovery_status,
        crate::handlers::recovery::pending_requests,
        crate::handlers::recovery::invite_guardian,
        crate::handlers::recovery::list_guardians,
        crate::handlers::recovery::accept_guardian,
    ),
)]
struct ApiDoc;

/// The OpenAPI definition.
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
