//! Network view DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::AggregatedNetwork;
use crate::render::NodeView;

/// Output format for `GET /players/{user_id}/network`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFormat {
    /// Structured JSON with the rendered view.
    #[default]
    Json,
    /// Plain-text tree.
    Text,
}

/// Query parameters for the network endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NetworkQuery {
    /// `json` (default) or `text`.
    #[serde(default)]
    pub format: NetworkFormat,
}

/// Response body for the network endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct NetworkResponse {
    /// `fresh`, `cached`, or `throttled`.
    pub source: String,
    /// Aggregation result.
    pub network: AggregatedNetwork,
    /// Render-ready tree with connector flags and node actions.
    pub view: NodeView,
}
