//! Speed control
//!
//! Single write path for playback rate: every change is rounded to two
//! decimals, clamped to the configured bounds, written to the element,
//! persisted, and reflected in the injected surfaces. Relative steps read
//! the element's live rate, so host-side changes are stepped from, not
//! fought.

use tempo_dom::NodeId;

use crate::audio_graph::{AudioGraphManager, CueKind};
use crate::config::keys;
use crate::context::EngineCtx;
use crate::host::Host;

/// Round to two decimals, away from the representation noise accumulated
/// by repeated fractional steps.
pub fn round2(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}

/// The playback-rate write path for the bound video.
#[derive(Debug, Default)]
pub struct SpeedController {
    bound: Option<NodeId>,
}

impl SpeedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, video: NodeId) {
        self.bound = Some(video);
    }

    pub fn unbind(&mut self) {
        self.bound = None;
    }

    pub fn bound(&self) -> Option<NodeId> {
        self.bound
    }

    /// Normalize `rate`, write it through, persist it and refresh the
    /// surfaces. Returns the rate actually applied, or `None` when nothing
    /// is bound.
    pub fn apply(&mut self, host: &mut Host, ctx: &mut EngineCtx, rate: f64) -> Option<f64> {
        let video = self.bound?;
        let min = ctx.settings.min_speed;
        let max = ctx.settings.max_speed;
        let applied = round2(rate).min(max).max(min);

        host.media.set_playback_rate(video, applied);
        ctx.save(keys::SPEED, &applied);
        ctx.surface.update_indicator(&mut host.doc, applied);
        let live_selector = ctx.config.selectors.live_indicator.clone();
        ctx.surface
            .update_remaining(&mut host.doc, &host.media, &ctx.settings, &live_selector, video);
        tracing::debug!("playback rate set to {applied}");
        Some(applied)
    }

    /// Step relative to the element's live rate, with an optional cue tone.
    pub fn shift(
        &mut self,
        host: &mut Host,
        ctx: &mut EngineCtx,
        audio: &mut AudioGraphManager,
        delta: f64,
        cue: Option<CueKind>,
    ) -> Option<f64> {
        if ctx.settings.sound_cues_enabled {
            if let Some(kind) = cue {
                audio.play_cue(&mut host.audio, kind);
            }
        }
        let video = self.bound?;
        let current = host.media.playback_rate(video).unwrap_or(1.0);
        self.apply(host, ctx, current + delta)
    }

    /// Back to 1.0x.
    pub fn reset(
        &mut self,
        host: &mut Host,
        ctx: &mut EngineCtx,
        audio: &mut AudioGraphManager,
    ) -> Option<f64> {
        if ctx.settings.sound_cues_enabled {
            audio.play_cue(&mut host.audio, CueKind::Reset);
        }
        self.apply(host, ctx, 1.0)
    }

    /// Re-assert the persisted rate, defaulting to 1.0x.
    pub fn restore_persisted(&mut self, host: &mut Host, ctx: &mut EngineCtx) -> Option<f64> {
        let rate = ctx.load_f64(keys::SPEED, 1.0);
        self.apply(host, ctx, rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Settings};
    use crate::store::MemoryStore;

    fn setup() -> (Host, EngineCtx, SpeedController, NodeId) {
        let mut host = Host::new();
        let video = host.doc.create_element("video");
        host.doc.append_child(host.doc.root(), video);
        host.media.register(video);
        let ctx = EngineCtx::new(
            EngineConfig::default(),
            Settings::default(),
            Box::new(MemoryStore::new()),
        );
        let mut speed = SpeedController::new();
        speed.bind(video);
        (host, ctx, speed, video)
    }

    #[test]
    fn test_apply_rounds_then_clamps() {
        let (mut host, mut ctx, mut speed, video) = setup();
        assert_eq!(speed.apply(&mut host, &mut ctx, 1.004999), Some(1.0));
        assert_eq!(speed.apply(&mut host, &mut ctx, 10.0), Some(4.0));
        assert_eq!(speed.apply(&mut host, &mut ctx, 0.1), Some(0.25));
        assert_eq!(host.media.playback_rate(video), Some(0.25));
    }

    #[test]
    fn test_floor_edge_rounds_before_clamping() {
        let (mut host, mut ctx, mut speed, _) = setup();
        host.media.set_playback_rate(speed.bound().unwrap(), 0.30);
        let mut audio = AudioGraphManager::new();
        // 0.30 - 0.05 rounds to exactly 0.25, the floor, not below it.
        assert_eq!(
            speed.shift(&mut host, &mut ctx, &mut audio, -0.05, None),
            Some(0.25)
        );
    }

    #[test]
    fn test_shift_steps_from_live_rate() {
        let (mut host, mut ctx, mut speed, video) = setup();
        let mut audio = AudioGraphManager::new();
        // The host page set a rate behind our back.
        host.media.set_playback_rate(video, 2.0);
        assert_eq!(
            speed.shift(&mut host, &mut ctx, &mut audio, 0.05, None),
            Some(2.05)
        );
    }

    #[test]
    fn test_apply_persists() {
        let (mut host, mut ctx, mut speed, _) = setup();
        speed.apply(&mut host, &mut ctx, 1.5);
        assert_eq!(ctx.load_f64(keys::SPEED, 1.0), 1.5);
    }

    #[test]
    fn test_restore_defaults_to_normal_speed() {
        let (mut host, mut ctx, mut speed, video) = setup();
        host.media.set_playback_rate(video, 3.0);
        assert_eq!(speed.restore_persisted(&mut host, &mut ctx), Some(1.0));
    }

    #[test]
    fn test_unbound_controller_is_inert() {
        let (mut host, mut ctx, mut speed, _) = setup();
        speed.unbind();
        assert_eq!(speed.apply(&mut host, &mut ctx, 2.0), None);
    }

    #[test]
    fn test_reset_cue_respects_setting() {
        let (mut host, mut ctx, mut speed, _) = setup();
        let mut audio = AudioGraphManager::new();
        ctx.settings.sound_cues_enabled = false;
        speed.reset(&mut host, &mut ctx, &mut audio);
        assert!(host.audio.tones().is_empty());

        ctx.settings.sound_cues_enabled = true;
        speed.reset(&mut host, &mut ctx, &mut audio);
        assert_eq!(host.audio.tones().len(), 1);
    }
}
