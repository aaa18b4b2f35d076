//! Invite handlers: send, resend, status tracking, accept.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    AcceptInviteRequest, AcceptInviteResponse, InviteDto, InviteStatusRequest,
    SendInviteRequest, SendInviteResponse,
};
use crate::app_state::AppState;
use crate::domain::{AuthUserId, InviteId};
use crate::error::{ErrorResponse, NetworkError};

/// `POST /players/{user_id}/invites`: Create and email an invite.
///
/// A failed email does not fail the request: the invite comes back with
/// status `email_failed` and `email_delivered: false`.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidRequest`] for a malformed recipient.
#[utoipa::path(
    post,
    path = "/api/v1/players/{user_id}/invites",
    tag = "Invites",
    summary = "Send an invite",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID of the inviter"),
    ),
    request_body = SendInviteRequest,
    responses(
        (status = 201, description = "Invite created", body = SendInviteResponse),
        (status = 400, description = "Malformed recipient", body = ErrorResponse),
        (status = 404, description = "Unknown player", body = ErrorResponse),
    )
)]
pub async fn send_invite(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Json(req): Json<SendInviteRequest>,
) -> Result<impl IntoResponse, NetworkError> {
    let delivered = state
        .invite_service
        .send_invite(AuthUserId::from_uuid(user_id), req.into())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SendInviteResponse::from(delivered)),
    ))
}

/// `POST /invites/{invite_id}/resend`: Email an invite again.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidTransition`] for accepted or declined
/// invites.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{invite_id}/resend",
    tag = "Invites",
    summary = "Resend an invite",
    params(
        ("invite_id" = uuid::Uuid, Path, description = "Invite UUID"),
    ),
    responses(
        (status = 200, description = "Delivery attempted", body = SendInviteResponse),
        (status = 404, description = "Unknown invite", body = ErrorResponse),
        (status = 409, description = "Invite already resolved", body = ErrorResponse),
    )
)]
pub async fn resend_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, NetworkError> {
    let delivered = state
        .invite_service
        .resend_invite(InviteId::from_uuid(invite_id))
        .await?;
    Ok(Json(SendInviteResponse::from(delivered)))
}

/// `POST /invites/{invite_id}/status`: Record a recipient action.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidTransition`] for moves the invite state
/// machine forbids.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{invite_id}/status",
    tag = "Invites",
    summary = "Record invite status",
    description = "Tracks `read`, `clicked` and `declined`. Acceptance goes through the accept endpoint.",
    params(
        ("invite_id" = uuid::Uuid, Path, description = "Invite UUID"),
    ),
    request_body = InviteStatusRequest,
    responses(
        (status = 200, description = "Status recorded", body = InviteDto),
        (status = 400, description = "Status not recordable here", body = ErrorResponse),
        (status = 404, description = "Unknown invite", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn record_invite_status(
    State(state): State<AppState>,
    Path(invite_id): Path<uuid::Uuid>,
    Json(req): Json<InviteStatusRequest>,
) -> Result<impl IntoResponse, NetworkError> {
    let invite = state
        .invite_service
        .record_invite_status(InviteId::from_uuid(invite_id), req.status)
        .await?;
    Ok(Json(InviteDto::from(invite)))
}

/// `POST /invites/{invite_id}/accept`: Accept an invite and link the
/// accepting player to the inviter.
///
/// # Errors
///
/// Returns [`NetworkError::Conflict`] if the player already has an upline.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{invite_id}/accept",
    tag = "Invites",
    summary = "Accept an invite",
    description = "Marks the invite accepted and creates the active relationship inviter → player in one transaction.",
    params(
        ("invite_id" = uuid::Uuid, Path, description = "Invite UUID"),
    ),
    request_body = AcceptInviteRequest,
    responses(
        (status = 200, description = "Invite accepted", body = AcceptInviteResponse),
        (status = 404, description = "Unknown invite or player", body = ErrorResponse),
        (status = 409, description = "Not acceptable or player already linked", body = ErrorResponse),
    )
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<uuid::Uuid>,
    Json(req): Json<AcceptInviteRequest>,
) -> Result<impl IntoResponse, NetworkError> {
    let (invite, rel) = state
        .invite_service
        .accept_invite(InviteId::from_uuid(invite_id), req.user_id)
        .await?;
    Ok(Json(AcceptInviteResponse {
        invite: invite.into(),
        relationship: rel.into(),
    }))
}

/// Invite routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/players/{user_id}/invites", post(send_invite))
        .route("/invites/{invite_id}/resend", post(resend_invite))
        .route("/invites/{invite_id}/status", post(record_invite_status))
        .route("/invites/{invite_id}/accept", post(accept_invite))
}
