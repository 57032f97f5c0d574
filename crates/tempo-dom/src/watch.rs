//! Subtree mutation watches
//!
//! Observe child-list and attribute changes under a scope node. Records
//! accumulate per watch and are drained with `take_records`, so consumers
//! poll on their own schedule.

use crate::NodeId;

/// Handle for an installed watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub(crate) u64);

/// What a watch reacts to.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    pub child_list: bool,
    pub attributes: bool,
    /// Observe the whole subtree under the scope, not just the scope itself.
    pub subtree: bool,
    /// When set, only these attribute names are reported.
    pub attribute_filter: Option<Vec<String>>,
}

impl WatchOptions {
    /// Child-list changes anywhere under the scope.
    pub fn subtree_children() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    /// Changes to a single attribute on the scope node itself.
    pub fn attribute(name: &str) -> Self {
        Self {
            attributes: true,
            attribute_filter: Some(vec![name.to_string()]),
            ..Default::default()
        }
    }
}

/// Kind of recorded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
}

/// One recorded mutation.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// The scope-relative target: the parent for child-list changes, the
    /// element itself for attribute changes.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

#[derive(Debug)]
pub(crate) struct Watch {
    pub(crate) scope: NodeId,
    pub(crate) options: WatchOptions,
    pub(crate) records: Vec<MutationRecord>,
}

impl Watch {
    /// Whether this watch wants the given record.
    pub(crate) fn wants(&self, record: &MutationRecord, in_scope: bool) -> bool {
        if !in_scope {
            return false;
        }
        match record.kind {
            MutationKind::ChildList => self.options.child_list,
            MutationKind::Attributes => {
                if !self.options.attributes {
                    return false;
                }
                match (&self.options.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                    _ => true,
                }
            }
        }
    }
}
