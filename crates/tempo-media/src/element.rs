//! Media elements
//!
//! Playback state per document node, plus listener registration and queued
//! event delivery. Listeners accumulate events; consumers drain them on
//! their own schedule, so delivery order is deterministic.

use std::collections::HashMap;

use tempo_dom::NodeId;

/// Playback state of one media element.
#[derive(Debug, Clone)]
pub struct MediaState {
    pub playback_rate: f64,
    /// Seconds; `NAN` before metadata, `INFINITY` for live media.
    pub duration: f64,
    pub current_time: f64,
    pub paused: bool,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            playback_rate: 1.0,
            duration: f64::NAN,
            current_time: 0.0,
            paused: true,
        }
    }
}

/// Media event kinds a bound element emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    Play,
    Pause,
    Seeked,
    LoadedMetadata,
    RateChange,
    TimeUpdate,
}

/// Handle for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug)]
struct Listener {
    node: NodeId,
    kind: MediaEventKind,
    queue: Vec<MediaEventKind>,
}

/// Registry of media elements and their listeners.
#[derive(Debug, Default)]
pub struct MediaHost {
    states: HashMap<NodeId, MediaState>,
    listeners: HashMap<ListenerId, Listener>,
    next_listener: u64,
}

impl MediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document node as a media element with default state.
    pub fn register(&mut self, node: NodeId) {
        self.states.entry(node).or_default();
    }

    pub fn state(&self, node: NodeId) -> Option<&MediaState> {
        self.states.get(&node)
    }

    pub fn state_mut(&mut self, node: NodeId) -> Option<&mut MediaState> {
        self.states.get_mut(&node)
    }

    pub fn playback_rate(&self, node: NodeId) -> Option<f64> {
        self.states.get(&node).map(|s| s.playback_rate)
    }

    /// Write the playback rate. Emits `RateChange` like a real media element
    /// does, whether the write came from the engine or the host page.
    pub fn set_playback_rate(&mut self, node: NodeId, rate: f64) {
        if let Some(state) = self.states.get_mut(&node) {
            state.playback_rate = rate;
            self.emit(node, MediaEventKind::RateChange);
        }
    }

    /// Register interest in one event kind on one element.
    pub fn listen(&mut self, node: NodeId, kind: MediaEventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            id,
            Listener {
                node,
                kind,
                queue: Vec::new(),
            },
        );
        id
    }

    /// Drop a listener; queued events it never drained are discarded.
    pub fn unlisten(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    /// How many listeners are attached to a node.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.values().filter(|l| l.node == node).count()
    }

    /// Queue an event for every matching listener.
    pub fn emit(&mut self, node: NodeId, kind: MediaEventKind) {
        for listener in self.listeners.values_mut() {
            if listener.node == node && listener.kind == kind {
                listener.queue.push(kind);
            }
        }
    }

    /// Drain the events queued for one listener.
    pub fn drain(&mut self, id: ListenerId) -> Vec<MediaEventKind> {
        self.listeners
            .get_mut(&id)
            .map(|l| std::mem::take(&mut l.queue))
            .unwrap_or_default()
    }
}
