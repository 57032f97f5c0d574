//! Video event bridge
//!
//! Subscribes to the bound video element's media events and its `src`
//! attribute, and folds the raw stream into the three signals the engine
//! acts on. Owns every listener and watch it creates, so one `detach_all`
//! always returns the element to silence.

use tempo_dom::{Document, NodeId, WatchId, WatchOptions};
use tempo_media::{ListenerId, MediaEventKind, MediaHost};

/// Progress updates are folded down to at most one per second.
const TIMEUPDATE_MIN_INTERVAL_MS: u64 = 1_000;

const BRIDGED_EVENTS: [MediaEventKind; 6] = [
    MediaEventKind::Play,
    MediaEventKind::Pause,
    MediaEventKind::Seeked,
    MediaEventKind::LoadedMetadata,
    MediaEventKind::RateChange,
    MediaEventKind::TimeUpdate,
];

/// What the engine should do in response to drained video activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeSignal {
    /// The element (re)started playback or swapped media; re-assert the
    /// persisted rate.
    RestorePersisted,
    /// The rate changed under us; refresh the indicator.
    RefreshIndicator,
    /// Progress or pause state moved; refresh the remaining-time display.
    RefreshRemaining,
}

/// Event subscriptions for the currently bound video element.
#[derive(Debug, Default)]
pub struct VideoEventBridge {
    listeners: Vec<ListenerId>,
    src_watch: Option<WatchId>,
    last_timeupdate: Option<u64>,
}

impl VideoEventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `video`. The caller detaches any previous element first;
    /// attaching twice would double-deliver events.
    pub fn attach(&mut self, doc: &mut Document, media: &mut MediaHost, video: NodeId) {
        debug_assert!(self.listeners.is_empty(), "attach over a live attachment");
        for kind in BRIDGED_EVENTS {
            self.listeners.push(media.listen(video, kind));
        }
        self.src_watch = Some(doc.watch(video, WatchOptions::attribute("src")));
        self.last_timeupdate = None;
        tracing::debug!("bridged video node {}", video.raw());
    }

    /// Remove every listener and watch. Safe to call repeatedly and when
    /// nothing is attached.
    pub fn detach_all(&mut self, doc: &mut Document, media: &mut MediaHost) {
        for id in self.listeners.drain(..) {
            media.unlisten(id);
        }
        if let Some(watch) = self.src_watch.take() {
            doc.unwatch(watch);
        }
        self.last_timeupdate = None;
    }

    /// Drain queued activity into engine signals. Progress updates inside
    /// the throttle window are dropped, not deferred.
    pub fn drain(&mut self, doc: &mut Document, media: &mut MediaHost, now: u64) -> Vec<BridgeSignal> {
        let mut signals = Vec::new();
        for id in self.listeners.clone() {
            for event in media.drain(id) {
                match event {
                    MediaEventKind::Play | MediaEventKind::LoadedMetadata => {
                        signals.push(BridgeSignal::RestorePersisted);
                    }
                    MediaEventKind::Pause | MediaEventKind::Seeked => {
                        signals.push(BridgeSignal::RefreshRemaining);
                    }
                    MediaEventKind::RateChange => {
                        signals.push(BridgeSignal::RefreshIndicator);
                    }
                    MediaEventKind::TimeUpdate => {
                        let due = self
                            .last_timeupdate
                            .map_or(true, |t| now.saturating_sub(t) >= TIMEUPDATE_MIN_INTERVAL_MS);
                        if due {
                            self.last_timeupdate = Some(now);
                            signals.push(BridgeSignal::RefreshRemaining);
                        }
                    }
                }
            }
        }
        if let Some(watch) = self.src_watch {
            if !doc.take_records(watch).is_empty() {
                signals.push(BridgeSignal::RestorePersisted);
                signals.push(BridgeSignal::RefreshRemaining);
            }
        }
        signals
    }
}
