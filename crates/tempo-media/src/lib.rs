//! Media playback surface and audio platform for the Tempo engine.
//!
//! `MediaHost` exposes per-node playback state and queued media events in
//! poll/drain style; `AudioHost` models the processing-graph platform,
//! including its hard one-source-node-per-element lifetime rule.

mod audio;
mod element;

pub use audio::{AudioContextState, AudioError, AudioHost, CueTone, GainId, SourceId};
pub use element::{ListenerId, MediaEventKind, MediaHost, MediaState};
