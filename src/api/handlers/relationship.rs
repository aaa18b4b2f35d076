//! Sponsor request handlers: request, cancel, accept, decline.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{RelationshipDto, SponsorRequestBody};
use crate::app_state::AppState;
use crate::domain::{AuthUserId, RelationshipId};
use crate::error::{ErrorResponse, NetworkError};

/// `POST /players/{user_id}/sponsor-requests`: Ask an admin to sponsor
/// the player.
///
/// # Errors
///
/// Returns [`NetworkError`] if the target is not an admin or the player
/// already has an upline.
#[utoipa::path(
    post,
    path = "/api/v1/players/{user_id}/sponsor-requests",
    tag = "Relationships",
    summary = "Request a sponsor",
    description = "Creates a pending relationship with the given admin as upline. A player can have only one upline relationship.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID of the requesting player"),
    ),
    request_body = SponsorRequestBody,
    responses(
        (status = 201, description = "Request created", body = RelationshipDto),
        (status = 400, description = "Target is not an admin", body = ErrorResponse),
        (status = 404, description = "Unknown player", body = ErrorResponse),
        (status = 409, description = "Player already has an upline", body = ErrorResponse),
    )
)]
pub async fn request_sponsor(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Json(req): Json<SponsorRequestBody>,
) -> Result<impl IntoResponse, NetworkError> {
    let rel = state
        .relationship_service
        .request_sponsor(AuthUserId::from_uuid(user_id), req.admin_profile_id)
        .await?;
    Ok((StatusCode::CREATED, Json(RelationshipDto::from(rel))))
}

/// `DELETE /players/{user_id}/sponsor-requests`: Withdraw the pending
/// sponsor request.
///
/// # Errors
///
/// Returns [`NetworkError::Conflict`] if nothing is pending.
#[utoipa::path(
    delete,
    path = "/api/v1/players/{user_id}/sponsor-requests",
    tag = "Relationships",
    summary = "Cancel the sponsor request",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID of the requesting player"),
    ),
    responses(
        (status = 200, description = "Deleted request", body = RelationshipDto),
        (status = 409, description = "No pending request", body = ErrorResponse),
    )
)]
pub async fn cancel_sponsor_request(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, NetworkError> {
    let rel = state
        .relationship_service
        .cancel_sponsor_request(AuthUserId::from_uuid(user_id))
        .await?;
    Ok(Json(RelationshipDto::from(rel)))
}

/// `POST /players/{user_id}/relationships/{relationship_id}/accept`
///
/// # Errors
///
/// Returns [`NetworkError::Forbidden`] unless the player is the upline.
#[utoipa::path(
    post,
    path = "/api/v1/players/{user_id}/relationships/{relationship_id}/accept",
    tag = "Relationships",
    summary = "Accept a downline",
    description = "Moves a pending relationship addressed to this player to active.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID of the upline"),
        ("relationship_id" = uuid::Uuid, Path, description = "Pending relationship UUID"),
    ),
    responses(
        (status = 200, description = "Relationship activated", body = RelationshipDto),
        (status = 403, description = "Not the upline", body = ErrorResponse),
        (status = 404, description = "Unknown relationship", body = ErrorResponse),
        (status = 409, description = "No longer pending", body = ErrorResponse),
    )
)]
pub async fn accept_downline(
    State(state): State<AppState>,
    Path((user_id, relationship_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, NetworkError> {
    let rel = state
        .relationship_service
        .accept_downline(
            AuthUserId::from_uuid(user_id),
            RelationshipId::from_uuid(relationship_id),
        )
        .await?;
    Ok(Json(RelationshipDto::from(rel)))
}

/// `POST /players/{user_id}/relationships/{relationship_id}/decline`
///
/// # Errors
///
/// Same as [`accept_downline`].
#[utoipa::path(
    post,
    path = "/api/v1/players/{user_id}/relationships/{relationship_id}/decline",
    tag = "Relationships",
    summary = "Decline a downline",
    description = "Deletes a pending relationship addressed to this player.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID of the upline"),
        ("relationship_id" = uuid::Uuid, Path, description = "Pending relationship UUID"),
    ),
    responses(
        (status = 200, description = "Relationship deleted", body = RelationshipDto),
        (status = 403, description = "Not the upline", body = ErrorResponse),
        (status = 404, description = "Unknown relationship", body = ErrorResponse),
        (status = 409, description = "No longer pending", body = ErrorResponse),
    )
)]
pub async fn decline_downline(
    State(state): State<AppState>,
    Path((user_id, relationship_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, NetworkError> {
    let rel = state
        .relationship_service
        .decline_downline(
            AuthUserId::from_uuid(user_id),
            RelationshipId::from_uuid(relationship_id),
        )
        .await?;
    Ok(Json(RelationshipDto::from(rel)))
}

/// Relationship routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/players/{user_id}/sponsor-requests",
            post(request_sponsor).delete(cancel_sponsor_request),
        )
        .route(
            "/players/{user_id}/relationships/{relationship_id}/accept",
            post(accept_downline),
        )
        .route(
            "/players/{user_id}/relationships/{relationship_id}/decline",
            post(decline_downline),
        )
}
