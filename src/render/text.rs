//! Plain-text rendering of the network tree.
//!
//! ```text
//! In Review
//! └── You
//!     ├── Invite
//!     ├── Alder
//!     └── Invite
//! ```

use std::fmt::Write;

use crate::domain::NetworkNode;

/// Renders `node` and its subtree as an indented ASCII tree.
#[must_use]
pub fn render_text(node: &NetworkNode) -> String {
    let mut out = String::new();
    out.push_str(&node.alias);
    out.push('\n');
    write_children(&mut out, node, "");
    out
}

fn write_children(out: &mut String, node: &NetworkNode, prefix: &str) {
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{}", child.alias);
        write_children(out, child, &format!("{prefix}{indent}"));
    }
}
