//! Element location
//!
//! Resolves player surfaces from ordered selector candidate lists. A lookup
//! that cannot resolve immediately becomes a `PendingLookup`: it installs a
//! mutation watch on the narrowest stable container and is polled on each
//! pump until a candidate resolves or the budget runs out. Candidates are
//! tried in order, each getting an equal slice of the total budget.

use tempo_dom::{Document, NodeId, WatchId, WatchOptions};

use crate::error::LocateError;

/// Outcome of starting a lookup.
#[derive(Debug)]
pub enum LookupStart {
    Found(NodeId),
    Pending(PendingLookup),
}

/// Outcome of polling a pending lookup. `Found` and `Failed` are terminal;
/// the lookup's watch is already removed when they are returned.
#[derive(Debug)]
pub enum LookupPoll {
    Found(NodeId),
    Pending,
    Failed(LocateError),
}

/// An in-flight candidate-list lookup.
#[derive(Debug)]
pub struct PendingLookup {
    selectors: Vec<String>,
    index: usize,
    slice_ms: u64,
    deadline: u64,
    watch: WatchId,
}

pub struct ElementLocator;

impl ElementLocator {
    /// Start resolving `selectors` in order. Resolves synchronously when the
    /// first candidate already matches; otherwise installs a subtree watch
    /// under the first of `scopes` that resolves (falling back to the root)
    /// and returns a pending lookup with `budget_ms` split across the
    /// candidates.
    pub fn begin(
        doc: &mut Document,
        selectors: &[String],
        budget_ms: u64,
        scopes: &[&str],
        now: u64,
    ) -> LookupStart {
        if let Some(first) = selectors.first() {
            if let Some(node) = doc.query_selector(first) {
                return LookupStart::Found(node);
            }
        }

        let scope = scopes
            .iter()
            .find_map(|s| doc.query_selector(s))
            .unwrap_or_else(|| doc.root());
        let watch = doc.watch(scope, WatchOptions::subtree_children());

        let slice_ms = (budget_ms / selectors.len().max(1) as u64).max(1);
        tracing::debug!(
            "waiting for {:?} ({} candidates, {}ms each)",
            selectors.first(),
            selectors.len(),
            slice_ms
        );
        LookupStart::Pending(PendingLookup {
            selectors: selectors.to_vec(),
            index: 0,
            slice_ms,
            deadline: now + slice_ms,
            watch,
        })
    }
}

impl PendingLookup {
    /// Re-check the current candidate, advancing through the list as slices
    /// expire. Removes the watch before returning a terminal outcome.
    pub fn poll(&mut self, doc: &mut Document, now: u64) -> LookupPoll {
        // Watch records only gate how often hosts bother polling; resolution
        // itself always re-queries the document.
        doc.take_records(self.watch);

        loop {
            if let Some(sel) = self.selectors.get(self.index) {
                if let Some(node) = doc.query_selector(sel) {
                    doc.unwatch(self.watch);
                    return LookupPoll::Found(node);
                }
            }
            if now < self.deadline {
                return LookupPoll::Pending;
            }
            self.index += 1;
            self.deadline += self.slice_ms;
            if self.index >= self.selectors.len() {
                doc.unwatch(self.watch);
                return LookupPoll::Failed(self.failure());
            }
        }
    }

    /// Abort the lookup, removing its watch.
    pub fn cancel(self, doc: &mut Document) {
        doc.unwatch(self.watch);
    }

    fn failure(&self) -> LocateError {
        if self.selectors.len() == 1 {
            LocateError::NotFound {
                selector: self.selectors[0].clone(),
                timeout_ms: self.slice_ms,
            }
        } else {
            LocateError::NoneResolved {
                tried: self.selectors.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_immediate_resolution() {
        let mut doc = Document::new();
        let player = doc.create_element("div");
        doc.set_id(player, "movie_player");
        doc.append_child(doc.root(), player);

        let start = ElementLocator::begin(&mut doc, &selectors(&["#movie_player"]), 5_000, &[], 0);
        assert!(matches!(start, LookupStart::Found(n) if n == player));
        assert_eq!(doc.watch_count(), 0);
    }

    #[test]
    fn test_late_arrival_resolves_on_poll() {
        let mut doc = Document::new();
        let start = ElementLocator::begin(&mut doc, &selectors(&["#movie_player"]), 5_000, &[], 0);
        let mut pending = match start {
            LookupStart::Pending(p) => p,
            LookupStart::Found(_) => panic!("nothing to find yet"),
        };
        assert!(matches!(pending.poll(&mut doc, 100), LookupPoll::Pending));

        let player = doc.create_element("div");
        doc.set_id(player, "movie_player");
        doc.append_child(doc.root(), player);

        assert!(matches!(
            pending.poll(&mut doc, 200),
            LookupPoll::Found(n) if n == player
        ));
        assert_eq!(doc.watch_count(), 0);
    }

    #[test]
    fn test_falls_through_to_next_candidate() {
        let mut doc = Document::new();
        let bar = doc.create_element("div");
        doc.add_class(bar, "ytp-right-controls");
        doc.append_child(doc.root(), bar);

        // Two candidates over 4s: the first gets 0..2000, the second matches.
        let start = ElementLocator::begin(
            &mut doc,
            &selectors(&["#missing", ".ytp-right-controls"]),
            4_000,
            &[],
            0,
        );
        let mut pending = match start {
            LookupStart::Pending(p) => p,
            LookupStart::Found(_) => panic!("first candidate must not match"),
        };
        assert!(matches!(pending.poll(&mut doc, 1_999), LookupPoll::Pending));
        assert!(matches!(
            pending.poll(&mut doc, 2_000),
            LookupPoll::Found(n) if n == bar
        ));
    }

    #[test]
    fn test_exhausted_budget_fails_with_full_list() {
        let mut doc = Document::new();
        let start =
            ElementLocator::begin(&mut doc, &selectors(&["#a", ".b"]), 4_000, &["#scope"], 0);
        let mut pending = match start {
            LookupStart::Pending(p) => p,
            LookupStart::Found(_) => panic!("nothing matches"),
        };
        match pending.poll(&mut doc, 4_000) {
            LookupPoll::Failed(LocateError::NoneResolved { tried }) => {
                assert_eq!(tried, selectors(&["#a", ".b"]));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(doc.watch_count(), 0);
    }

    #[test]
    fn test_single_candidate_failure_names_selector() {
        let mut doc = Document::new();
        let start = ElementLocator::begin(&mut doc, &selectors(&["#only"]), 5_000, &[], 0);
        let mut pending = match start {
            LookupStart::Pending(p) => p,
            LookupStart::Found(_) => panic!("nothing matches"),
        };
        match pending.poll(&mut doc, 5_000) {
            LookupPoll::Failed(LocateError::NotFound {
                selector,
                timeout_ms,
            }) => {
                assert_eq!(selector, "#only");
                assert_eq!(timeout_ms, 5_000);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_cancel_removes_watch() {
        let mut doc = Document::new();
        let start = ElementLocator::begin(&mut doc, &selectors(&["#gone"]), 5_000, &[], 0);
        match start {
            LookupStart::Pending(p) => p.cancel(&mut doc),
            LookupStart::Found(_) => panic!("nothing matches"),
        }
        assert_eq!(doc.watch_count(), 0);
    }
}
