//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers::{invite, network, relationship, system};
use crate::error::ErrorResponse;

/// Generated OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "tabletop-network",
        description = "Player network: sponsor requests, downlines, and invites."
    ),
    paths(
        network::get_network,
        network::refetch_network,
        relationship::request_sponsor,
        relationship::cancel_sponsor_request,
        relationship::accept_downline,
        relationship::decline_downline,
        invite::send_invite,
        invite::resend_invite,
        invite::record_invite_status,
        invite::accept_invite,
        system::health_handler,
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "Network", description = "Aggregated network view"),
        (name = "Relationships", description = "Sponsor requests and decisions"),
        (name = "Invites", description = "Invite delivery and lifecycle"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
