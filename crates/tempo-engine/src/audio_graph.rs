//! Audio graph management
//!
//! Builds and tears down the volume-boost graph (element source -> gain ->
//! destination) and schedules cue tones. At most one source/gain pair is
//! live at a time; rebinding to the same element is a no-op, and a failed
//! build leaves no half-wired nodes behind.

use tempo_dom::NodeId;
use tempo_media::{AudioContextState, AudioError, AudioHost, CueTone, GainId, SourceId};

/// Lifecycle of the managed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioGraphState {
    /// No context yet.
    Uninitialized,
    /// Context exists, no element wired.
    Ready,
    /// Graph is wired to this element.
    Bound(NodeId),
}

/// Audible feedback for speed changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Slower,
    Reset,
    Faster,
}

fn tone_for(kind: CueKind) -> CueTone {
    match kind {
        CueKind::Slower => CueTone {
            start_hz: 800.0,
            end_hz: 200.0,
            duration_ms: 120,
            gain: 0.2,
        },
        CueKind::Reset => CueTone {
            start_hz: 330.0,
            end_hz: 330.0,
            duration_ms: 80,
            gain: 0.2,
        },
        CueKind::Faster => CueTone {
            start_hz: 600.0,
            end_hz: 1_200.0,
            duration_ms: 120,
            gain: 0.2,
        },
    }
}

/// Owner of the engine's audio nodes.
#[derive(Debug)]
pub struct AudioGraphManager {
    state: AudioGraphState,
    source: Option<SourceId>,
    gain: Option<GainId>,
}

impl Default for AudioGraphManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGraphManager {
    pub fn new() -> Self {
        Self {
            state: AudioGraphState::Uninitialized,
            source: None,
            gain: None,
        }
    }

    pub fn state(&self) -> AudioGraphState {
        self.state
    }

    /// Create the context if needed and try to resume it. Resumption is
    /// attempted on every call because the host may suspend the context at
    /// any time, and user gestures are when resuming is allowed.
    fn ensure_context(&mut self, audio: &mut AudioHost) -> Result<(), AudioError> {
        if audio.context_state().is_none() {
            audio.create_context()?;
        }
        if self.state == AudioGraphState::Uninitialized {
            self.state = AudioGraphState::Ready;
        }
        if audio.context_state() == Some(AudioContextState::Suspended) {
            audio.resume()?;
        }
        Ok(())
    }

    /// Wire the boost graph to `video` at `boost` gain. Binding the element
    /// that is already bound does nothing; binding a different element
    /// releases the old pair first.
    pub fn bind(
        &mut self,
        audio: &mut AudioHost,
        video: NodeId,
        boost: f64,
    ) -> Result<(), AudioError> {
        if self.state == AudioGraphState::Bound(video) {
            return Ok(());
        }
        self.ensure_context(audio)?;
        self.release_pair(audio);

        let source = audio.create_media_source(video)?;
        let gain = match audio.create_gain() {
            Ok(gain) => gain,
            Err(e) => {
                audio.disconnect_source(source);
                return Err(e);
            }
        };
        audio.connect_source(source, gain);
        audio.connect_gain_to_destination(gain);
        audio.set_gain(gain, boost);

        self.source = Some(source);
        self.gain = Some(gain);
        self.state = AudioGraphState::Bound(video);
        tracing::debug!("boost graph bound to node {}", video.raw());
        Ok(())
    }

    /// Release the current pair, keeping the context alive for a later bind.
    pub fn unbind(&mut self, audio: &mut AudioHost) {
        self.release_pair(audio);
    }

    /// Adjust the boost level on the live gain node, if any.
    pub fn set_boost(&mut self, audio: &mut AudioHost, level: f64) {
        if let Some(gain) = self.gain {
            audio.set_gain(gain, level);
        }
    }

    /// Schedule an audible cue. Cue failures are logged and dropped; audible
    /// feedback is never worth failing a speed change over.
    pub fn play_cue(&mut self, audio: &mut AudioHost, kind: CueKind) {
        if let Err(e) = self.try_cue(audio, kind) {
            tracing::debug!("cue tone unavailable: {e}");
        }
    }

    fn try_cue(&mut self, audio: &mut AudioHost, kind: CueKind) -> Result<(), AudioError> {
        self.ensure_context(audio)?;
        audio.play_tone(tone_for(kind))
    }

    /// Full shutdown: drop the pair and close the context. The next bind
    /// starts from a fresh context with fresh element claims.
    pub fn close(&mut self, audio: &mut AudioHost) {
        self.source = None;
        self.gain = None;
        audio.close();
        self.state = AudioGraphState::Uninitialized;
    }

    fn release_pair(&mut self, audio: &mut AudioHost) {
        if let Some(source) = self.source.take() {
            audio.disconnect_source(source);
        }
        if let Some(gain) = self.gain.take() {
            audio.disconnect_gain(gain);
        }
        if let AudioGraphState::Bound(_) = self.state {
            self.state = AudioGraphState::Ready;
        }
    }
}
