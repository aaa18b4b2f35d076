//! Data Transfer Objects for REST request/response serialization.

pub mod invite_dto;
pub mod network_dto;
pub mod relationship_dto;

pub use invite_dto::*;
pub use network_dto::*;
pub use relationship_dto::*;
