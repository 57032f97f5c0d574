//! Audio platform
//!
//! Processing context, media-element source nodes, gain nodes and cue
//! tones. Enforces the platform's hard rule: a source node can be created
//! at most once per media element for the context's lifetime.

use std::collections::{HashMap, HashSet};

use tempo_dom::NodeId;

/// Audio context state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioContextState {
    #[default]
    Suspended,
    Running,
    Closed,
}

/// Audio platform error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AudioError {
    #[error("no audio context")]
    NoContext,

    #[error("audio context is closed")]
    ContextClosed,

    #[error("audio context construction refused")]
    ContextRefused,

    #[error("media element already claimed by a source node")]
    SourceTaken,

    #[error("source construction refused for element")]
    SourceRefused,
}

/// Handle for a media-element source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u32);

/// Handle for a gain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GainId(u32);

/// A short audible cue tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueTone {
    pub start_hz: f64,
    pub end_hz: f64,
    pub duration_ms: u64,
    pub gain: f64,
}

#[derive(Debug)]
struct SourceNode {
    node: NodeId,
    connected_to: Option<GainId>,
}

#[derive(Debug)]
struct GainNode {
    value: f64,
    to_destination: bool,
}

/// The audio-processing platform.
#[derive(Debug, Default)]
pub struct AudioHost {
    context: Option<AudioContextState>,
    /// Elements a source node was ever created for, for the lifetime of the
    /// current context. A second creation attempt fails hard.
    claimed: HashSet<NodeId>,
    sources: HashMap<SourceId, SourceNode>,
    gains: HashMap<GainId, GainNode>,
    denied_sources: HashSet<NodeId>,
    deny_context: bool,
    tones: Vec<CueTone>,
    next_id: u32,
}

impl AudioHost {
    pub fn new() -> Self {
        Self::default()
    }

    // === Failure injection (host-side configuration) ===

    /// Make source construction fail for an element, as a cross-origin
    /// tainted element would.
    pub fn deny_source(&mut self, node: NodeId) {
        self.denied_sources.insert(node);
    }

    /// Make context construction fail, as a permission denial would.
    pub fn deny_context(&mut self) {
        self.deny_context = true;
    }

    // === Context lifecycle ===

    pub fn context_state(&self) -> Option<AudioContextState> {
        self.context
    }

    /// Create the context. New contexts start suspended until resumed, per
    /// autoplay policy.
    pub fn create_context(&mut self) -> Result<(), AudioError> {
        if self.deny_context {
            return Err(AudioError::ContextRefused);
        }
        if self.context.is_none() {
            self.context = Some(AudioContextState::Suspended);
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), AudioError> {
        match self.context {
            None => Err(AudioError::NoContext),
            Some(AudioContextState::Closed) => Err(AudioError::ContextClosed),
            Some(_) => {
                self.context = Some(AudioContextState::Running);
                Ok(())
            }
        }
    }

    /// The host page may suspend a running context at any time.
    pub fn suspend(&mut self) {
        if let Some(AudioContextState::Running) = self.context {
            self.context = Some(AudioContextState::Suspended);
        }
    }

    /// Close and discard the context. All nodes and element claims die with
    /// it; a later `create_context` starts fresh.
    pub fn close(&mut self) {
        self.context = None;
        self.claimed.clear();
        self.sources.clear();
        self.gains.clear();
    }

    // === Graph nodes ===

    /// Create a source node for a media element. Fails permanently for an
    /// element that was ever claimed during this context's lifetime.
    pub fn create_media_source(&mut self, node: NodeId) -> Result<SourceId, AudioError> {
        self.require_context()?;
        if self.claimed.contains(&node) {
            return Err(AudioError::SourceTaken);
        }
        if self.denied_sources.contains(&node) {
            tracing::debug!("source construction refused for node {}", node.raw());
            return Err(AudioError::SourceRefused);
        }
        self.claimed.insert(node);
        let id = SourceId(self.next_id());
        self.sources.insert(
            id,
            SourceNode {
                node,
                connected_to: None,
            },
        );
        Ok(id)
    }

    pub fn create_gain(&mut self) -> Result<GainId, AudioError> {
        self.require_context()?;
        let id = GainId(self.next_id());
        self.gains.insert(
            id,
            GainNode {
                value: 1.0,
                to_destination: false,
            },
        );
        Ok(id)
    }

    pub fn connect_source(&mut self, source: SourceId, gain: GainId) {
        if let Some(s) = self.sources.get_mut(&source) {
            s.connected_to = Some(gain);
        }
    }

    pub fn connect_gain_to_destination(&mut self, gain: GainId) {
        if let Some(g) = self.gains.get_mut(&gain) {
            g.to_destination = true;
        }
    }

    pub fn disconnect_source(&mut self, source: SourceId) {
        if let Some(s) = self.sources.get_mut(&source) {
            s.connected_to = None;
        }
    }

    pub fn disconnect_gain(&mut self, gain: GainId) {
        if let Some(g) = self.gains.get_mut(&gain) {
            g.to_destination = false;
        }
    }

    pub fn set_gain(&mut self, gain: GainId, value: f64) {
        if let Some(g) = self.gains.get_mut(&gain) {
            g.value = value;
        }
    }

    pub fn gain_value(&self, gain: GainId) -> Option<f64> {
        self.gains.get(&gain).map(|g| g.value)
    }

    /// Schedule a cue tone on the context output.
    pub fn play_tone(&mut self, tone: CueTone) -> Result<(), AudioError> {
        self.require_context()?;
        self.tones.push(tone);
        Ok(())
    }

    /// Tones scheduled so far.
    pub fn tones(&self) -> &[CueTone] {
        &self.tones
    }

    // === Inspection ===

    pub fn is_claimed(&self, node: NodeId) -> bool {
        self.claimed.contains(&node)
    }

    /// Source nodes currently wired element -> gain -> destination. The
    /// engine's invariant is that this never exceeds one.
    pub fn live_pairs(&self) -> usize {
        self.sources
            .values()
            .filter(|s| {
                s.connected_to
                    .and_then(|g| self.gains.get(&g))
                    .map(|g| g.to_destination)
                    .unwrap_or(false)
            })
            .count()
    }

    /// The element feeding the destination right now, if any.
    pub fn live_source_element(&self) -> Option<NodeId> {
        self.sources
            .values()
            .find(|s| {
                s.connected_to
                    .and_then(|g| self.gains.get(&g))
                    .map(|g| g.to_destination)
                    .unwrap_or(false)
            })
            .map(|s| s.node)
    }

    fn require_context(&self) -> Result<(), AudioError> {
        match self.context {
            None => Err(AudioError::NoContext),
            Some(AudioContextState::Closed) => Err(AudioError::ContextClosed),
            Some(_) => Ok(()),
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes() -> (NodeId, NodeId) {
        let mut doc = tempo_dom::Document::new();
        (doc.create_element("video"), doc.create_element("video"))
    }

    #[test]
    fn test_context_lifecycle() {
        let mut audio = AudioHost::new();
        assert_eq!(audio.context_state(), None);

        audio.create_context().unwrap();
        assert_eq!(audio.context_state(), Some(AudioContextState::Suspended));

        audio.resume().unwrap();
        assert_eq!(audio.context_state(), Some(AudioContextState::Running));

        audio.suspend();
        assert_eq!(audio.context_state(), Some(AudioContextState::Suspended));
    }

    #[test]
    fn test_source_is_one_shot_per_element() {
        let mut audio = AudioHost::new();
        let (a, _) = two_nodes();
        audio.create_context().unwrap();

        let first = audio.create_media_source(a);
        assert!(first.is_ok());

        let second = audio.create_media_source(a);
        assert!(matches!(second, Err(AudioError::SourceTaken)));
    }

    #[test]
    fn test_close_releases_claims() {
        let mut audio = AudioHost::new();
        let (a, _) = two_nodes();
        audio.create_context().unwrap();
        audio.create_media_source(a).unwrap();
        assert!(audio.is_claimed(a));

        audio.close();
        assert!(!audio.is_claimed(a));
        assert_eq!(audio.context_state(), None);

        audio.create_context().unwrap();
        assert!(audio.create_media_source(a).is_ok());
    }

    #[test]
    fn test_live_pair_accounting() {
        let mut audio = AudioHost::new();
        let (a, b) = two_nodes();
        audio.create_context().unwrap();

        let src_a = audio.create_media_source(a).unwrap();
        let gain_a = audio.create_gain().unwrap();
        audio.connect_source(src_a, gain_a);
        audio.connect_gain_to_destination(gain_a);
        assert_eq!(audio.live_pairs(), 1);
        assert_eq!(audio.live_source_element(), Some(a));

        audio.disconnect_source(src_a);
        audio.disconnect_gain(gain_a);
        assert_eq!(audio.live_pairs(), 0);

        let src_b = audio.create_media_source(b).unwrap();
        let gain_b = audio.create_gain().unwrap();
        audio.connect_source(src_b, gain_b);
        audio.connect_gain_to_destination(gain_b);
        assert_eq!(audio.live_pairs(), 1);
        assert_eq!(audio.live_source_element(), Some(b));
    }

    #[test]
    fn test_denied_source_fails_without_claim() {
        let mut audio = AudioHost::new();
        let (a, _) = two_nodes();
        audio.create_context().unwrap();
        audio.deny_source(a);

        assert!(matches!(
            audio.create_media_source(a),
            Err(AudioError::SourceRefused)
        ));
        assert!(!audio.is_claimed(a));
    }
}
