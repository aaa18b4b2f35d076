//! Presentation of the derived network tree: a structured view model for
//! clients and a plain-text form for logs and terminals.

pub mod text;
pub mod tree_view;

pub use text::render_text;
pub use tree_view::{
    InviteSide, NodeAction, NodeBody, NodeView, RenderContext, render_network, render_tree,
};
