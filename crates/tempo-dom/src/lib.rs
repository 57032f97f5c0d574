//! Deterministic document model for the Tempo playback engine.
//!
//! A small in-memory element tree with reference-style node identity, a
//! CSS-like selector subset, and subtree mutation watches. The engine core
//! consumes this as its host-document capability; tests drive it directly.

mod document;
mod element;
mod selector;
mod watch;

pub use document::Document;
pub use element::Element;
pub use selector::{parse_selector, Selector, SelectorError};
pub use watch::{MutationKind, MutationRecord, WatchId, WatchOptions};

/// Unique identifier for a node.
///
/// Identity is what the engine compares across reconciles: two `NodeId`s are
/// equal exactly when they name the same element, mirroring reference
/// equality of host DOM nodes. Ids stay valid after removal so a detached
/// element can still be recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw index, for diagnostics.
    pub fn raw(self) -> u32 {
        self.0
    }
}
