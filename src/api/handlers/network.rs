//! Network view handlers: aggregated network and explicit refetch.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{NetworkFormat, NetworkQuery, NetworkResponse};
use crate::app_state::AppState;
use crate::domain::AuthUserId;
use crate::error::{ErrorResponse, NetworkError};
use crate::render::{render_network, render_text};
use crate::service::NetworkFetch;

/// `GET /players/{user_id}/network`: Aggregated network of a player.
///
/// # Errors
///
/// Returns [`NetworkError::ProfileNotFound`] for an unknown auth user and
/// [`NetworkError::Throttled`] when throttled with nothing cached.
#[utoipa::path(
    get,
    path = "/api/v1/players/{user_id}/network",
    tag = "Network",
    summary = "Get a player's network",
    description = "Returns the sponsor, downlines, admin profiles and the rendered tree. Served from cache for 30 s; fetches are at most one per 2 s per player.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID"),
        NetworkQuery,
    ),
    responses(
        (status = 200, description = "Network view", body = NetworkResponse),
        (status = 404, description = "No player profile", body = ErrorResponse),
        (status = 429, description = "Throttled with nothing cached", body = ErrorResponse),
    )
)]
pub async fn get_network(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Query(query): Query<NetworkQuery>,
) -> Result<Response, NetworkError> {
    let user = AuthUserId::from_uuid(user_id);
    let outcome = state.network_service.get_network(Some(user)).await?;
    respond(
        user,
        &outcome,
        query.format,
        state.network_service.cache().throttle(),
    )
}

/// `POST /players/{user_id}/network/refetch`: Drop the cached network
/// and aggregate again.
///
/// # Errors
///
/// Same as [`get_network`].
#[utoipa::path(
    post,
    path = "/api/v1/players/{user_id}/network/refetch",
    tag = "Network",
    summary = "Refetch a player's network",
    description = "Invalidates the cached network and aggregates again unless the previous fetch was less than 2 s ago, in which case `source` is `throttled`.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Auth user UUID"),
        NetworkQuery,
    ),
    responses(
        (status = 200, description = "Network view", body = NetworkResponse),
        (status = 404, description = "No player profile", body = ErrorResponse),
        (status = 429, description = "Throttled with nothing cached", body = ErrorResponse),
    )
)]
pub async fn refetch_network(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Query(query): Query<NetworkQuery>,
) -> Result<Response, NetworkError> {
    let user = AuthUserId::from_uuid(user_id);
    let outcome = state.network_service.refetch(user).await?;
    respond(
        user,
        &outcome,
        query.format,
        state.network_service.cache().throttle(),
    )
}

fn respond(
    user: AuthUserId,
    outcome: &NetworkFetch,
    format: NetworkFormat,
    throttle: Duration,
) -> Result<Response, NetworkError> {
    let Some(network) = outcome.network() else {
        return Err(match outcome {
            NetworkFetch::Throttled(None) => NetworkError::Throttled {
                retry_after_ms: u64::try_from(throttle.as_millis()).unwrap_or(u64::MAX),
            },
            _ => NetworkError::ProfileNotFound(*user.as_uuid()),
        });
    };

    let response = match format {
        NetworkFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            render_text(&network.network),
        )
            .into_response(),
        NetworkFormat::Json => Json(NetworkResponse {
            source: outcome.source().to_string(),
            view: render_network(network),
            network: (**network).clone(),
        })
        .into_response(),
    };
    Ok(response)
}

/// Network view routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/players/{user_id}/network", get(get_network))
        .route("/players/{user_id}/network/refetch", post(refetch_network))
}
