//! Engine configuration
//!
//! Host-page selectors and timing knobs, plus the persisted user settings.
//! `EngineConfig` is fixed at construction; `Settings` round-trips through
//! the key-value store one key at a time so a corrupt entry only loses that
//! entry.

use serde::{Deserialize, Serialize};

use crate::store::{self, KeyValueStore};

/// Storage keys for persisted settings. Every value is stored as JSON.
pub mod keys {
    pub const SPEED: &str = "tempo-playback-rate";
    pub const SPEED_STEP: &str = "tempo-speed-step";
    pub const MIN_SPEED: &str = "tempo-min-speed";
    pub const MAX_SPEED: &str = "tempo-max-speed";
    pub const VOLUME_BOOST: &str = "tempo-volume-boost";
    pub const REMAINING_TIME: &str = "tempo-remaining-time-enabled";
    pub const SOUND_CUES: &str = "tempo-sound-cues-enabled";
    pub const OVERRIDE_SHORTCUTS: &str = "tempo-override-host-shortcuts";
    pub const SHORTCUT_SLOWER: &str = "tempo-shortcut-slower";
    pub const SHORTCUT_RESET: &str = "tempo-shortcut-reset";
    pub const SHORTCUT_FASTER: &str = "tempo-shortcut-faster";
}

/// Selectors for the player surfaces the engine binds to. Each role carries
/// an ordered candidate list; the first selector that resolves wins.
#[derive(Debug, Clone)]
pub struct SelectorRoles {
    pub player_controls: Vec<String>,
    pub video_element: Vec<String>,
    pub time_display: String,
    pub live_indicator: String,
    pub player_container: String,
    pub watch_container: String,
}

impl Default for SelectorRoles {
    fn default() -> Self {
        Self {
            player_controls: vec![
                ".ytp-chrome-controls .ytp-right-controls".to_string(),
                ".ytp-right-controls".to_string(),
                "#movie_player .ytp-chrome-controls .ytp-right-controls".to_string(),
            ],
            video_element: vec![
                "#movie_player video".to_string(),
                "video.html5-main-video".to_string(),
                "video[src]".to_string(),
            ],
            time_display: ".ytp-time-display".to_string(),
            live_indicator: ".ytp-live".to_string(),
            player_container: "#movie_player".to_string(),
            watch_container: "#page-manager ytd-watch-flexy".to_string(),
        }
    }
}

/// Fixed engine parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub selectors: SelectorRoles,
    /// Quiet window a navigation signal must survive before a reconcile runs.
    pub debounce_ms: u64,
    /// Total time budget for one candidate-list lookup, split evenly across
    /// the candidates.
    pub locator_budget_ms: u64,
    /// Route prefix for short-form pages, where the engine stays unbound.
    pub short_form_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorRoles::default(),
            debounce_ms: 250,
            locator_budget_ms: 5_000,
            short_form_prefix: "/shorts/".to_string(),
        }
    }
}

/// Persisted user settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub speed_step: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub volume_boost: f64,
    pub remaining_time_enabled: bool,
    pub sound_cues_enabled: bool,
    pub override_host_shortcuts: bool,
    pub shortcut_slower: String,
    pub shortcut_reset: String,
    pub shortcut_faster: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed_step: 0.05,
            min_speed: 0.25,
            max_speed: 4.0,
            volume_boost: 1.0,
            remaining_time_enabled: true,
            sound_cues_enabled: true,
            override_host_shortcuts: false,
            shortcut_slower: "[".to_string(),
            shortcut_reset: "\\".to_string(),
            shortcut_faster: "]".to_string(),
        }
    }
}

impl Settings {
    /// Load every setting from the store, falling back to the default for
    /// any key that is missing or unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let d = Self::default();
        Self {
            speed_step: store::load_json(store, keys::SPEED_STEP, d.speed_step),
            min_speed: store::load_json(store, keys::MIN_SPEED, d.min_speed),
            max_speed: store::load_json(store, keys::MAX_SPEED, d.max_speed),
            volume_boost: store::load_json(store, keys::VOLUME_BOOST, d.volume_boost),
            remaining_time_enabled: store::load_json(
                store,
                keys::REMAINING_TIME,
                d.remaining_time_enabled,
            ),
            sound_cues_enabled: store::load_json(store, keys::SOUND_CUES, d.sound_cues_enabled),
            override_host_shortcuts: store::load_json(
                store,
                keys::OVERRIDE_SHORTCUTS,
                d.override_host_shortcuts,
            ),
            shortcut_slower: store::load_json(store, keys::SHORTCUT_SLOWER, d.shortcut_slower),
            shortcut_reset: store::load_json(store, keys::SHORTCUT_RESET, d.shortcut_reset),
            shortcut_faster: store::load_json(store, keys::SHORTCUT_FASTER, d.shortcut_faster),
        }
    }
}
