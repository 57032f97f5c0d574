//! Tempo engine
//!
//! Binds playback controls to a host page's video player and keeps them
//! synchronized across navigations, player rebuilds and media swaps. The
//! engine is virtual-time and single-threaded: the embedder feeds it
//! navigation signals, input events and a monotonic clock through
//! [`BindingManager::pump`], and the engine drives the host [`Host`]
//! document, media and audio surfaces in response.
//!
//! The hard rules it maintains:
//! - at most one live binding (chrome + video) at any time;
//! - at most one audio source/gain pair feeding the destination;
//! - a torn-down binding leaves no listeners, watches or injected nodes.

mod audio_graph;
mod binding;
mod bridge;
mod config;
mod context;
mod controls;
mod error;
mod host;
mod locator;
mod shortcuts;
mod speed;
mod store;

pub use audio_graph::{AudioGraphManager, AudioGraphState, CueKind};
pub use binding::{BindingManager, LiveBinding};
pub use bridge::{BridgeSignal, VideoEventBridge};
pub use config::{keys, EngineConfig, SelectorRoles, Settings};
pub use context::{EngineCtx, EngineStats, Notice};
pub use controls::{format_time, remaining_seconds, ButtonRole, ControlSurface};
pub use error::{EngineError, LocateError};
pub use host::Host;
pub use locator::{ElementLocator, LookupPoll, LookupStart, PendingLookup};
pub use shortcuts::{action_for, SpeedAction};
pub use speed::{round2, SpeedController};
pub use store::{KeyValueStore, MemoryStore, StoreError};
