//! Injected control surface
//!
//! The engine's own UI inside the player chrome: three speed buttons, a
//! rate indicator and an optional remaining-time readout next to the host's
//! time display. The surface tracks every node it created so removal never
//! touches host-owned chrome.

use tempo_dom::{Document, NodeId};
use tempo_media::MediaHost;

use crate::config::Settings;

const BUTTON_CLASS: &str = "tempo-button";
const SLOWER_CLASS: &str = "tempo-slower";
const RESET_CLASS: &str = "tempo-reset";
const FASTER_CLASS: &str = "tempo-faster";
const INDICATOR_CLASS: &str = "tempo-speed-indicator";
const REMAINING_CLASS: &str = "tempo-remaining-time";

/// Which injected button a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    Slower,
    Reset,
    Faster,
}

/// Nodes the engine injected into the player chrome.
#[derive(Debug, Default)]
pub struct ControlSurface {
    controls_bar: Option<NodeId>,
    slower: Option<NodeId>,
    reset: Option<NodeId>,
    faster: Option<NodeId>,
    indicator: Option<NodeId>,
    remaining: Option<NodeId>,
}

impl ControlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the buttons and indicator at the front of `controls_bar`. The
    /// caller removes any previous surface first.
    pub fn inject(&mut self, doc: &mut Document, controls_bar: NodeId) {
        let slower = Self::button(doc, SLOWER_CLASS, "\u{2212}");
        let reset = Self::button(doc, RESET_CLASS, "1\u{d7}");
        let faster = Self::button(doc, FASTER_CLASS, "+");

        let indicator = doc.create_element("div");
        doc.add_class(indicator, INDICATOR_CLASS);

        // Prepend in reverse so the bar reads slower, reset, faster, rate.
        for node in [indicator, faster, reset, slower] {
            doc.prepend_child(controls_bar, node);
        }

        self.controls_bar = Some(controls_bar);
        self.slower = Some(slower);
        self.reset = Some(reset);
        self.faster = Some(faster);
        self.indicator = Some(indicator);
        tracing::debug!("control surface injected");
    }

    fn button(doc: &mut Document, class: &str, label: &str) -> NodeId {
        let node = doc.create_element("button");
        doc.add_class(node, BUTTON_CLASS);
        doc.add_class(node, class);
        doc.set_text(node, label);
        node
    }

    /// Whether the full surface is still connected under the bar it was
    /// injected into.
    pub fn is_present(&self, doc: &Document) -> bool {
        let Some(bar) = self.controls_bar else {
            return false;
        };
        if !doc.is_connected(bar) {
            return false;
        }
        [self.slower, self.reset, self.faster, self.indicator]
            .iter()
            .all(|slot| slot.is_some_and(|n| doc.parent(n) == Some(bar)))
    }

    /// Remove every injected node. Idempotent.
    pub fn remove(&mut self, doc: &mut Document) {
        for slot in [
            self.slower.take(),
            self.reset.take(),
            self.faster.take(),
            self.indicator.take(),
            self.remaining.take(),
        ] {
            if let Some(node) = slot {
                doc.remove(node);
            }
        }
        self.controls_bar = None;
    }

    /// The role of an injected button node, if it is one.
    pub fn button_role(&self, node: NodeId) -> Option<ButtonRole> {
        if Some(node) == self.slower {
            Some(ButtonRole::Slower)
        } else if Some(node) == self.reset {
            Some(ButtonRole::Reset)
        } else if Some(node) == self.faster {
            Some(ButtonRole::Faster)
        } else {
            None
        }
    }

    pub fn update_indicator(&self, doc: &mut Document, rate: f64) {
        if let Some(node) = self.indicator {
            doc.set_text(node, &format!("{rate:.2}x"));
        }
    }

    // === Remaining-time readout ===

    /// Place the readout right after the host's time display. Returns false
    /// when it already exists or the time display is missing.
    pub fn ensure_remaining(&mut self, doc: &mut Document, time_display_selector: &str) -> bool {
        if self.remaining.is_some_and(|n| doc.is_connected(n)) {
            return false;
        }
        let Some(display) = doc.query_selector(time_display_selector) else {
            tracing::debug!("no time display at {time_display_selector:?}");
            return false;
        };
        let node = doc.create_element("span");
        doc.add_class(node, REMAINING_CLASS);
        doc.insert_after(display, node);
        self.remaining = Some(node);
        true
    }

    pub fn remaining_present(&self, doc: &Document) -> bool {
        self.remaining.is_some_and(|n| doc.is_connected(n))
    }

    pub fn remove_remaining(&mut self, doc: &mut Document) {
        if let Some(node) = self.remaining.take() {
            doc.remove(node);
        }
    }

    /// Recompute the readout text. Blank while paused, during live streams,
    /// before metadata, or when the feature is off.
    pub fn update_remaining(
        &self,
        doc: &mut Document,
        media: &MediaHost,
        settings: &Settings,
        live_selector: &str,
        video: NodeId,
    ) {
        let Some(node) = self.remaining else {
            return;
        };
        let text = if settings.remaining_time_enabled {
            Self::remaining_text(doc, media, live_selector, video)
        } else {
            None
        };
        doc.set_text(node, text.as_deref().unwrap_or(""));
    }

    fn remaining_text(
        doc: &Document,
        media: &MediaHost,
        live_selector: &str,
        video: NodeId,
    ) -> Option<String> {
        let state = media.state(video)?;
        if state.paused || !state.duration.is_finite() {
            return None;
        }
        if doc.query_selector(live_selector).is_some() {
            return None;
        }
        let remaining = remaining_seconds(state.duration, state.current_time, state.playback_rate)?;
        Some(format!("({})", format_time(remaining)))
    }
}

/// Wall-clock seconds left at the current rate, or `None` when the inputs
/// cannot produce a finite non-negative answer.
pub fn remaining_seconds(duration: f64, current_time: f64, rate: f64) -> Option<f64> {
    if !duration.is_finite() || rate <= 0.0 {
        return None;
    }
    let left = (duration - current_time) / rate;
    left.is_finite().then(|| left.max(0.0))
}

/// `h:mm:ss` above an hour, `mm:ss` below.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let h = total / 3_600;
    let m = (total % 3_600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let bar = doc.create_element("div");
        doc.add_class(bar, "ytp-right-controls");
        doc.append_child(doc.root(), bar);
        let display = doc.create_element("div");
        doc.add_class(display, "ytp-time-display");
        doc.append_child(doc.root(), display);
        (doc, bar, display)
    }

    #[test]
    fn test_inject_and_presence() {
        let (mut doc, bar, _) = chrome();
        let mut surface = ControlSurface::new();
        assert!(!surface.is_present(&doc));

        surface.inject(&mut doc, bar);
        assert!(surface.is_present(&doc));
        assert_eq!(doc.children(bar).len(), 4);
    }

    #[test]
    fn test_presence_fails_after_host_wipes_bar() {
        let (mut doc, bar, _) = chrome();
        let mut surface = ControlSurface::new();
        surface.inject(&mut doc, bar);

        for child in doc.children(bar).to_vec() {
            doc.remove(child);
        }
        assert!(!surface.is_present(&doc));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut doc, bar, _) = chrome();
        let mut surface = ControlSurface::new();
        surface.inject(&mut doc, bar);
        surface.remove(&mut doc);
        surface.remove(&mut doc);
        assert!(doc.children(bar).is_empty());
        assert!(!surface.is_present(&doc));
    }

    #[test]
    fn test_button_roles() {
        let (mut doc, bar, _) = chrome();
        let mut surface = ControlSurface::new();
        surface.inject(&mut doc, bar);

        let children = doc.children(bar).to_vec();
        assert_eq!(surface.button_role(children[0]), Some(ButtonRole::Slower));
        assert_eq!(surface.button_role(children[1]), Some(ButtonRole::Reset));
        assert_eq!(surface.button_role(children[2]), Some(ButtonRole::Faster));
        assert_eq!(surface.button_role(children[3]), None);
        assert_eq!(surface.button_role(bar), None);
    }

    #[test]
    fn test_remaining_readout_placement_and_text() {
        let (mut doc, _, display) = chrome();
        let mut media = MediaHost::new();
        let video = doc.create_element("video");
        doc.append_child(doc.root(), video);
        media.register(video);

        let mut surface = ControlSurface::new();
        assert!(surface.ensure_remaining(&mut doc, ".ytp-time-display"));
        assert!(!surface.ensure_remaining(&mut doc, ".ytp-time-display"));

        let readout = doc
            .query_selector(".tempo-remaining-time")
            .expect("readout injected");
        let siblings = doc.children(doc.root()).to_vec();
        let pos_display = siblings.iter().position(|&n| n == display).unwrap();
        assert_eq!(siblings[pos_display + 1], readout);

        let settings = Settings::default();
        {
            let state = media.state_mut(video);
            if let Some(state) = state {
                state.duration = 600.0;
                state.current_time = 0.0;
                state.playback_rate = 2.0;
                state.paused = false;
            }
        }
        surface.update_remaining(&mut doc, &media, &settings, ".ytp-live", video);
        assert_eq!(doc.text(readout), "(05:00)");
    }

    #[test]
    fn test_remaining_blank_when_paused_or_live() {
        let (mut doc, _, _) = chrome();
        let mut media = MediaHost::new();
        let video = doc.create_element("video");
        doc.append_child(doc.root(), video);
        media.register(video);
        let settings = Settings::default();

        let mut surface = ControlSurface::new();
        surface.ensure_remaining(&mut doc, ".ytp-time-display");
        let readout = surface.remaining.unwrap();

        if let Some(state) = media.state_mut(video) {
            state.duration = 100.0;
            state.paused = true;
        }
        surface.update_remaining(&mut doc, &media, &settings, ".ytp-live", video);
        assert_eq!(doc.text(readout), "");

        if let Some(state) = media.state_mut(video) {
            state.paused = false;
        }
        let badge = doc.create_element("div");
        doc.add_class(badge, "ytp-live");
        doc.append_child(doc.root(), badge);
        surface.update_remaining(&mut doc, &media, &settings, ".ytp-live", video);
        assert_eq!(doc.text(readout), "");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(300.0), "05:00");
        assert_eq!(format_time(3_661.0), "1:01:01");
    }

    #[test]
    fn test_remaining_seconds() {
        assert_eq!(remaining_seconds(600.0, 0.0, 2.0), Some(300.0));
        assert_eq!(remaining_seconds(600.0, 700.0, 1.0), Some(0.0));
        assert_eq!(remaining_seconds(f64::INFINITY, 0.0, 1.0), None);
        assert_eq!(remaining_seconds(f64::NAN, 0.0, 1.0), None);
        assert_eq!(remaining_seconds(600.0, 0.0, 0.0), None);
    }
}
