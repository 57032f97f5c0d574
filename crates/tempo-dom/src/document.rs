//! Document tree
//!
//! Owns the element tree, runs selector queries, and fans mutations out to
//! installed watches.

use std::collections::HashMap;

use crate::element::Element;
use crate::selector::{parse_selector, Compound, Selector};
use crate::watch::{MutationKind, MutationRecord, Watch, WatchId, WatchOptions};
use crate::NodeId;

#[derive(Debug)]
struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The document: element tree plus mutation watch registry.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    watches: HashMap<WatchId, Watch>,
    next_watch: u64,
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            element: Element::new("body"),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            watches: HashMap::new(),
            next_watch: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // === Tree construction ===

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            element: Element::new(tag),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.node_mut(node).element.id = Some(id.to_string());
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let el = &mut self.node_mut(node).element;
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.node_mut(node).element.text = text.to_string();
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.node(node).element.text
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.node(node).element.tag
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).element.attr(name)
    }

    /// Set an attribute, recording an attribute mutation.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let old = self
            .node_mut(node)
            .element
            .attributes
            .insert(name.to_string(), value.to_string());
        self.notify(MutationRecord {
            kind: MutationKind::Attributes,
            target: node,
            added: Vec::new(),
            removed: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value: old,
        });
    }

    /// Remove an attribute, recording an attribute mutation if it existed.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(old) = self.node_mut(node).element.attributes.remove(name) {
            self.notify(MutationRecord {
                kind: MutationKind::Attributes,
                target: node,
                added: Vec::new(),
                removed: Vec::new(),
                attribute_name: Some(name.to_string()),
                old_value: Some(old),
            });
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, child, usize::MAX);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, child, 0);
    }

    /// Insert `node` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.node(reference).parent else {
            return;
        };
        let pos = self
            .node(parent)
            .children
            .iter()
            .position(|&c| c == reference)
            .map(|p| p + 1)
            .unwrap_or(usize::MAX);
        self.insert_child(parent, node, pos);
    }

    fn insert_child(&mut self, parent: NodeId, child: NodeId, position: usize) {
        self.detach(child);
        let children = &mut self.node_mut(parent).children;
        let position = position.min(children.len());
        children.insert(position, child);
        self.node_mut(child).parent = Some(parent);
        self.notify(MutationRecord {
            kind: MutationKind::ChildList,
            target: parent,
            added: vec![child],
            removed: Vec::new(),
            attribute_name: None,
            old_value: None,
        });
    }

    /// Remove a node (with its subtree) from the document. The node and its
    /// id remain valid for identity comparisons.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.detach(node);
            self.notify(MutationRecord {
                kind: MutationKind::ChildList,
                target: parent,
                added: Vec::new(),
                removed: vec![node],
                attribute_name: None,
                old_value: None,
            });
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != node);
        }
    }

    // === Tree queries ===

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `node` lies in the subtree under `ancestor` (excluding it).
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.node(node).parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.node(p).parent;
        }
        false
    }

    // === Selector queries ===

    /// First match in document order, or `None`. Unparsable selectors log
    /// and resolve to nothing rather than failing the caller.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_from(self.root, selector)
    }

    /// First match among the descendants of `scope`.
    pub fn query_selector_from(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let parsed = match parse_selector(selector) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("ignoring unparsable selector {selector:?}: {e}");
                return None;
            }
        };
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.matches_parsed(n, &parsed))
    }

    /// Whether the node matches the selector (with ancestor context).
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.matches_parsed(node, selector)
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope).children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev().copied());
        }
        out
    }

    fn matches_parsed(&self, node: NodeId, selector: &Selector) -> bool {
        let Some((last, rest)) = selector.compounds.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }
        // Each earlier compound must match some strictly higher ancestor.
        let mut current = self.node(node).parent;
        for compound in rest.iter().rev() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = self.node(ancestor).parent;
                if self.matches_compound(ancestor, compound) {
                    break;
                }
            }
        }
        true
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let el = &self.node(node).element;
        if let Some(tag) = &compound.tag {
            if el.tag != *tag {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if el.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !compound.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        compound.attrs.iter().all(|check| match &check.value {
            None => el.attr(&check.name).is_some(),
            Some(v) => el.attr(&check.name) == Some(v.as_str()),
        })
    }

    // === Mutation watches ===

    /// Install a watch over `scope`.
    pub fn watch(&mut self, scope: NodeId, options: WatchOptions) -> WatchId {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watches.insert(
            id,
            Watch {
                scope,
                options,
                records: Vec::new(),
            },
        );
        id
    }

    /// Remove a watch. Unknown ids are ignored.
    pub fn unwatch(&mut self, id: WatchId) {
        self.watches.remove(&id);
    }

    /// Drain the records accumulated by a watch.
    pub fn take_records(&mut self, id: WatchId) -> Vec<MutationRecord> {
        self.watches
            .get_mut(&id)
            .map(|w| std::mem::take(&mut w.records))
            .unwrap_or_default()
    }

    /// Number of live watches. Rebind correctness checks lean on this.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    fn notify(&mut self, record: MutationRecord) {
        // Scope membership has to be computed against the tree, so collect
        // interested watch ids first.
        let interested: Vec<WatchId> = self
            .watches
            .iter()
            .filter(|(_, w)| {
                let in_scope = record.target == w.scope
                    || (w.options.subtree && self.contains(w.scope, record.target));
                w.wants(&record, in_scope)
            })
            .map(|(&id, _)| id)
            .collect();
        for id in interested {
            if let Some(w) = self.watches.get_mut(&id) {
                w.records.push(record.clone());
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
