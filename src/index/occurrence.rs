//! Occurrences: named AST nodes detached from their translation unit

use compact_str::CompactString;
use serde::Serialize;
use std::sync::Arc;

use crate::parse::{AstNode, CursorKind, Location};

/// A named node recorded in the index
///
/// `referenced` is a snapshot of the declaration the node was bound to when
/// its unit was parsed; it is only ever read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub spelling: CompactString,
    pub kind: CursorKind,
    pub location: Location,
    pub has_body: bool,
    pub referenced: Option<Arc<Occurrence>>,
}

impl Occurrence {
    /// Snapshot of a single node, without its cross-reference
    pub fn from_node(node: &AstNode) -> Self {
        Self {
            spelling: node.spelling.clone(),
            kind: node.kind,
            location: node.location.clone(),
            has_body: node.has_body,
            referenced: None,
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.kind.is_declaration()
    }
}
