//! Keyboard shortcuts
//!
//! Maps a key press to a speed action using the user's configured bindings.
//! Matching is exact on the key string the host delivers.

use crate::config::Settings;

/// Action a shortcut resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedAction {
    Slower,
    Reset,
    Faster,
}

/// Resolve `key` against the configured bindings.
pub fn action_for(settings: &Settings, key: &str) -> Option<SpeedAction> {
    if key == settings.shortcut_slower {
        Some(SpeedAction::Slower)
    } else if key == settings.shortcut_reset {
        Some(SpeedAction::Reset)
    } else if key == settings.shortcut_faster {
        Some(SpeedAction::Faster)
    } else {
        None
    }
}
