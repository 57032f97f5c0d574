//! Shared engine state
//!
//! Configuration, live settings, the persistence backend, the injected
//! control surface and counters, bundled so the engine's components can
//! borrow them together.

use serde::Serialize;

use crate::config::{EngineConfig, Settings};
use crate::controls::ControlSurface;
use crate::store::{self, KeyValueStore};

/// User-facing advisory. Deduplicated per page lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The audio platform refused the boost graph; a user gesture or
    /// permission change is needed.
    AudioPermissionRequired,
    /// The bound video is a live stream; remaining time is meaningless.
    LiveStreamDetected,
}

/// Counters for observability and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineStats {
    pub reconciles: u64,
    pub rebinds: u64,
    pub ui_injections: u64,
    pub teardowns: u64,
}

/// State shared across the engine's components.
#[derive(Debug)]
pub struct EngineCtx {
    pub config: EngineConfig,
    pub settings: Settings,
    pub store: Box<dyn KeyValueStore>,
    pub surface: ControlSurface,
    pub stats: EngineStats,
    notices: Vec<Notice>,
    audio_notice_sent: bool,
    live_notice_sent: bool,
}

impl EngineCtx {
    pub fn new(config: EngineConfig, settings: Settings, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            config,
            settings,
            store,
            surface: ControlSurface::new(),
            stats: EngineStats::default(),
            notices: Vec::new(),
            audio_notice_sent: false,
            live_notice_sent: false,
        }
    }

    pub fn load_f64(&self, key: &str, default: f64) -> f64 {
        store::load_json(self.store.as_ref(), key, default)
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        store::save_json(self.store.as_mut(), key, value);
    }

    /// Queue an advisory, at most once each. The live-stream advisory is
    /// re-armed when the binding is torn down; the audio one is not, since
    /// the permission problem outlives any single binding.
    pub fn push_notice(&mut self, notice: Notice) {
        let sent = match notice {
            Notice::AudioPermissionRequired => &mut self.audio_notice_sent,
            Notice::LiveStreamDetected => &mut self.live_notice_sent,
        };
        if !*sent {
            *sent = true;
            self.notices.push(notice);
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn rearm_live_notice(&mut self) {
        self.live_notice_sent = false;
    }
}
