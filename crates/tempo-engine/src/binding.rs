//! Binding lifecycle
//!
//! The engine's top level. Owns the single live binding between the player
//! chrome and the video element, and the reconcile state machine that
//! creates, repairs and tears it down. Navigation signals are debounced;
//! reconciles that cannot resolve their surfaces immediately wait through
//! the locator; anything that goes wrong collapses back to a clean unbound
//! state.

use tempo_dom::NodeId;
use tempo_media::AudioError;

use crate::audio_graph::{AudioGraphManager, CueKind};
use crate::bridge::{BridgeSignal, VideoEventBridge};
use crate::config::{keys, EngineConfig, Settings};
use crate::context::{EngineCtx, EngineStats, Notice};
use crate::controls::ButtonRole;
use crate::error::EngineError;
use crate::host::Host;
use crate::locator::{ElementLocator, LookupPoll, LookupStart, PendingLookup};
use crate::shortcuts::{self, SpeedAction};
use crate::speed::SpeedController;
use crate::store::{KeyValueStore, MemoryStore};

/// The one live binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveBinding {
    pub controls: NodeId,
    pub video: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupStage {
    Controls,
    Video,
}

#[derive(Debug)]
struct LookupSequence {
    stage: LookupStage,
    controls: Option<NodeId>,
    pending: PendingLookup,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Debouncing { deadline: u64 },
    Locating(LookupSequence),
}

/// Top-level engine: reconcile state machine plus the bound components.
#[derive(Debug)]
pub struct BindingManager {
    ctx: EngineCtx,
    bridge: VideoEventBridge,
    audio: AudioGraphManager,
    speed: SpeedController,
    binding: Option<LiveBinding>,
    phase: Phase,
    /// A trigger that arrived while a reconcile was in flight; becomes the
    /// next debounce window once the current reconcile settles.
    queued_trigger: Option<u64>,
    route: String,
}

impl BindingManager {
    pub fn new(config: EngineConfig, store: Box<dyn KeyValueStore>) -> Self {
        let settings = Settings::load(store.as_ref());
        Self {
            ctx: EngineCtx::new(config, settings, store),
            bridge: VideoEventBridge::new(),
            audio: AudioGraphManager::new(),
            speed: SpeedController::new(),
            binding: None,
            phase: Phase::Idle,
            queued_trigger: None,
            route: "/".to_string(),
        }
    }

    /// Engine with an in-memory settings store.
    pub fn with_memory_store(config: EngineConfig) -> Self {
        Self::new(config, Box::new(MemoryStore::new()))
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    pub fn stats(&self) -> EngineStats {
        self.ctx.stats
    }

    pub fn current_binding(&self) -> Option<LiveBinding> {
        self.binding
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Whether a reconcile is debouncing, locating, or queued.
    pub fn reconcile_pending(&self) -> bool {
        !matches!(self.phase, Phase::Idle) || self.queued_trigger.is_some()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.ctx.take_notices()
    }

    // === Inputs ===

    /// Record a route change and request a reconcile.
    pub fn navigate(&mut self, route: &str, now: u64) {
        if self.route != route {
            tracing::debug!("route change {:?} -> {:?}", self.route, route);
            self.route = route.to_string();
        }
        self.trigger(now);
    }

    /// Request a reconcile. Requests within one debounce window collapse
    /// into a single reconcile; requests during an in-flight reconcile are
    /// queued behind it rather than interleaved.
    pub fn trigger(&mut self, now: u64) {
        let deadline = now + self.ctx.config.debounce_ms;
        if matches!(self.phase, Phase::Locating(_)) {
            self.queued_trigger = Some(deadline);
        } else {
            self.phase = Phase::Debouncing { deadline };
        }
    }

    /// Advance timers and drain video activity. The embedder calls this on
    /// its own cadence; `now` only ever moves forward.
    pub fn pump(&mut self, host: &mut Host, now: u64) {
        self.advance(host, now);
        for signal in self.bridge.drain(&mut host.doc, &mut host.media, now) {
            self.apply_signal(host, signal);
        }
    }

    /// A click on some document node; consumed when it is one of ours.
    pub fn click(&mut self, host: &mut Host, node: NodeId) -> bool {
        let Some(role) = self.ctx.surface.button_role(node) else {
            return false;
        };
        let step = self.ctx.settings.speed_step;
        match role {
            ButtonRole::Slower => {
                self.speed
                    .shift(host, &mut self.ctx, &mut self.audio, -step, Some(CueKind::Slower));
            }
            ButtonRole::Reset => {
                self.speed.reset(host, &mut self.ctx, &mut self.audio);
            }
            ButtonRole::Faster => {
                self.speed
                    .shift(host, &mut self.ctx, &mut self.audio, step, Some(CueKind::Faster));
            }
        }
        true
    }

    /// A key press. Returns whether the host page's own handling should be
    /// suppressed, which is only the case when the key matched one of our
    /// bindings and the user opted into overriding.
    pub fn handle_key(&mut self, host: &mut Host, key: &str) -> bool {
        let Some(action) = shortcuts::action_for(&self.ctx.settings, key) else {
            return false;
        };
        let step = self.ctx.settings.speed_step;
        match action {
            SpeedAction::Slower => {
                self.speed
                    .shift(host, &mut self.ctx, &mut self.audio, -step, Some(CueKind::Slower));
            }
            SpeedAction::Reset => {
                self.speed.reset(host, &mut self.ctx, &mut self.audio);
            }
            SpeedAction::Faster => {
                self.speed
                    .shift(host, &mut self.ctx, &mut self.audio, step, Some(CueKind::Faster));
            }
        }
        self.ctx.settings.override_host_shortcuts
    }

    // === Settings ===

    pub fn set_boost(&mut self, host: &mut Host, level: f64) {
        self.ctx.settings.volume_boost = level;
        self.ctx.save(keys::VOLUME_BOOST, &level);
        self.audio.set_boost(&mut host.audio, level);
    }

    pub fn set_remaining_time_enabled(&mut self, host: &mut Host, enabled: bool) {
        self.ctx.settings.remaining_time_enabled = enabled;
        self.ctx.save(keys::REMAINING_TIME, &enabled);
        if enabled {
            if let Some(binding) = self.binding {
                let display = self.ctx.config.selectors.time_display.clone();
                self.ctx.surface.ensure_remaining(&mut host.doc, &display);
                self.refresh_remaining(host, binding.video);
            }
        } else {
            self.ctx.surface.remove_remaining(&mut host.doc);
        }
    }

    pub fn set_speed_step(&mut self, step: f64) {
        self.ctx.settings.speed_step = step;
        self.ctx.save(keys::SPEED_STEP, &step);
    }

    /// Update the rate bounds and re-clamp the live rate through the normal
    /// write path.
    pub fn set_speed_limits(&mut self, host: &mut Host, min: f64, max: f64) {
        let min = min.min(max);
        self.ctx.settings.min_speed = min;
        self.ctx.settings.max_speed = max;
        self.ctx.save(keys::MIN_SPEED, &min);
        self.ctx.save(keys::MAX_SPEED, &max);
        if let Some(video) = self.speed.bound() {
            let current = host.media.playback_rate(video).unwrap_or(1.0);
            self.speed.apply(host, &mut self.ctx, current);
        }
    }

    pub fn set_sound_cues_enabled(&mut self, enabled: bool) {
        self.ctx.settings.sound_cues_enabled = enabled;
        self.ctx.save(keys::SOUND_CUES, &enabled);
    }

    /// Full shutdown: abort any in-flight reconcile, tear down the binding
    /// and close the audio context.
    pub fn teardown(&mut self, host: &mut Host) {
        if let Phase::Locating(seq) = std::mem::replace(&mut self.phase, Phase::Idle) {
            seq.pending.cancel(&mut host.doc);
        }
        self.queued_trigger = None;
        self.teardown_binding(host);
        self.audio.close(&mut host.audio);
    }

    // === Reconcile state machine ===

    fn advance(&mut self, host: &mut Host, now: u64) {
        if let Phase::Debouncing { deadline } = self.phase {
            if now >= deadline {
                self.phase = Phase::Idle;
                self.start_reconcile(host, now);
            }
            return;
        }
        if matches!(self.phase, Phase::Locating(_)) {
            self.poll_lookup(host, now);
        }
    }

    fn start_reconcile(&mut self, host: &mut Host, now: u64) {
        self.ctx.stats.reconciles += 1;
        tracing::debug!("reconciling for route {:?}", self.route);
        if self.route.starts_with(&self.ctx.config.short_form_prefix) {
            self.teardown_binding(host);
            self.after_reconcile();
            return;
        }
        let selectors = self.ctx.config.selectors.player_controls.clone();
        self.begin_lookup(host, LookupStage::Controls, None, &selectors, now);
    }

    fn begin_lookup(
        &mut self,
        host: &mut Host,
        stage: LookupStage,
        controls: Option<NodeId>,
        selectors: &[String],
        now: u64,
    ) {
        let player = self.ctx.config.selectors.player_container.clone();
        let watch = self.ctx.config.selectors.watch_container.clone();
        let scopes = [player.as_str(), watch.as_str()];
        let budget = self.ctx.config.locator_budget_ms;
        match ElementLocator::begin(&mut host.doc, selectors, budget, &scopes, now) {
            LookupStart::Found(node) => self.lookup_found(host, stage, controls, node, now),
            LookupStart::Pending(pending) => {
                self.phase = Phase::Locating(LookupSequence {
                    stage,
                    controls,
                    pending,
                });
            }
        }
    }

    fn poll_lookup(&mut self, host: &mut Host, now: u64) {
        let settled = match &mut self.phase {
            Phase::Locating(seq) => match seq.pending.poll(&mut host.doc, now) {
                LookupPoll::Pending => None,
                LookupPoll::Found(node) => Some((seq.stage, seq.controls, Ok(node))),
                LookupPoll::Failed(e) => Some((seq.stage, seq.controls, Err(e))),
            },
            _ => None,
        };
        let Some((stage, controls, outcome)) = settled else {
            return;
        };
        self.phase = Phase::Idle;
        match outcome {
            Ok(node) => self.lookup_found(host, stage, controls, node, now),
            Err(e) => {
                tracing::warn!("player surfaces unresolved: {e}");
                self.teardown_binding(host);
                self.after_reconcile();
            }
        }
    }

    fn lookup_found(
        &mut self,
        host: &mut Host,
        stage: LookupStage,
        controls: Option<NodeId>,
        node: NodeId,
        now: u64,
    ) {
        match stage {
            LookupStage::Controls => {
                let selectors = self.ctx.config.selectors.video_element.clone();
                self.begin_lookup(host, LookupStage::Video, Some(node), &selectors, now);
            }
            LookupStage::Video => {
                debug_assert!(controls.is_some(), "video stage without controls");
                let Some(controls) = controls else {
                    return;
                };
                match self.finish_reconcile(host, controls, node) {
                    Ok(()) => {}
                    Err(e) => {
                        tracing::warn!("binding failed, tearing down: {e}");
                        self.teardown_binding(host);
                    }
                }
                self.after_reconcile();
            }
        }
    }

    /// Both surfaces resolved; repair or rebuild the binding. Elements can
    /// have left the document while the lookup was pending, so connectivity
    /// is re-checked before anything is wired.
    fn finish_reconcile(
        &mut self,
        host: &mut Host,
        controls: NodeId,
        video: NodeId,
    ) -> Result<(), EngineError> {
        if !host.doc.is_connected(controls) || !host.doc.is_connected(video) {
            return Err(EngineError::StaleResolution);
        }
        host.media.register(video);

        let same_controls = self.binding.is_some_and(|b| b.controls == controls);
        if !(same_controls && self.ctx.surface.is_present(&host.doc)) {
            self.ctx.surface.remove(&mut host.doc);
            self.ctx.surface.inject(&mut host.doc, controls);
            self.ctx.stats.ui_injections += 1;
            if self.ctx.settings.remaining_time_enabled {
                let display = self.ctx.config.selectors.time_display.clone();
                self.ctx.surface.ensure_remaining(&mut host.doc, &display);
            }
        }

        let same_video = self.binding.is_some_and(|b| b.video == video);
        if same_video {
            if let Some(rate) = host.media.playback_rate(video) {
                self.ctx.surface.update_indicator(&mut host.doc, rate);
            }
            // The host can wipe the readout without touching the video.
            if self.ctx.settings.remaining_time_enabled
                && !self.ctx.surface.remaining_present(&host.doc)
            {
                let display = self.ctx.config.selectors.time_display.clone();
                self.ctx.surface.ensure_remaining(&mut host.doc, &display);
            }
            self.refresh_remaining(host, video);
        } else {
            self.bridge.detach_all(&mut host.doc, &mut host.media);
            self.bridge.attach(&mut host.doc, &mut host.media, video);
            let boost = self.ctx.settings.volume_boost;
            if let Err(e) = self.audio.bind(&mut host.audio, video, boost) {
                tracing::warn!("volume boost unavailable: {e}");
                if matches!(e, AudioError::SourceRefused | AudioError::ContextRefused) {
                    self.ctx.push_notice(Notice::AudioPermissionRequired);
                }
            }
            self.speed.bind(video);
            self.speed.restore_persisted(host, &mut self.ctx);
            self.ctx.stats.rebinds += 1;
        }

        let live = host
            .media
            .state(video)
            .is_some_and(|s| s.duration == f64::INFINITY);
        if live {
            self.ctx.push_notice(Notice::LiveStreamDetected);
        }

        self.binding = Some(LiveBinding { controls, video });
        Ok(())
    }

    fn after_reconcile(&mut self) {
        if let Some(deadline) = self.queued_trigger.take() {
            self.phase = Phase::Debouncing { deadline };
        }
    }

    /// Release everything the binding holds. Idempotent; the audio context
    /// stays alive for a later rebind.
    fn teardown_binding(&mut self, host: &mut Host) {
        self.bridge.detach_all(&mut host.doc, &mut host.media);
        self.audio.unbind(&mut host.audio);
        self.speed.unbind();
        self.ctx.surface.remove(&mut host.doc);
        if self.binding.take().is_some() {
            self.ctx.stats.teardowns += 1;
            tracing::debug!("binding torn down");
        }
        self.ctx.rearm_live_notice();
    }

    fn refresh_remaining(&mut self, host: &mut Host, video: NodeId) {
        let live = self.ctx.config.selectors.live_indicator.clone();
        self.ctx
            .surface
            .update_remaining(&mut host.doc, &host.media, &self.ctx.settings, &live, video);
    }

    fn apply_signal(&mut self, host: &mut Host, signal: BridgeSignal) {
        let Some(binding) = self.binding else {
            return;
        };
        match signal {
            BridgeSignal::RestorePersisted => {
                self.speed.restore_persisted(host, &mut self.ctx);
            }
            BridgeSignal::RefreshIndicator => {
                if let Some(rate) = host.media.playback_rate(binding.video) {
                    self.ctx.surface.update_indicator(&mut host.doc, rate);
                }
                self.refresh_remaining(host, binding.video);
            }
            BridgeSignal::RefreshRemaining => {
                self.refresh_remaining(host, binding.video);
            }
        }
    }
}
