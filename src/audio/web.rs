//! Web Audio playback
//!
//! Procedurally generated sound effects - no external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::{Ambient, SoundEffect, ambient_for, cue_for};
use crate::settings::Settings;
use crate::sim::{EventSink, GameEvent};

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    sfx_gain: f32,
    music_gain: f32,
    muted: bool,
    /// Running drone, if any
    ambient: Option<(OscillatorNode, GainNode)>,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            sfx_gain: settings.sfx_gain(),
            music_gain: settings.music_gain(),
            muted: false,
            ambient: None,
        }
    }

    /// Pick up changed volume settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sfx_gain = settings.sfx_gain();
        self.music_gain = settings.music_gain();
        if let (Some((_, gain)), Some(ctx)) = (&self.ambient, &self.ctx) {
            gain.gain()
                .set_value_at_time(self.music_gain * 0.06, ctx.current_time())
                .ok();
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_ambient();
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_gain }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Catch => self.play_catch(ctx, vol),
            SoundEffect::HarmfulCatch => self.play_harmful(ctx, vol),
            SoundEffect::Explosion => self.play_explosion(ctx, vol),
            SoundEffect::Blocked => self.play_blocked(ctx, vol),
            SoundEffect::Heal => self.play_heal(ctx, vol),
            SoundEffect::Miss => self.play_miss(ctx, vol),
            SoundEffect::LevelUp => self.play_arpeggio(ctx, vol, &[400.0, 500.0, 600.0, 800.0], 0.1),
            SoundEffect::GameOver => self.play_game_over(ctx, vol),
            SoundEffect::HighScore => {
                self.play_arpeggio(ctx, vol, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08)
            }
        }
    }

    /// Start the low ambient drone
    pub fn start_ambient(&mut self) {
        if self.ambient.is_some() || self.muted || self.music_gain <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Some((osc, gain)) = create_osc(ctx, 110.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.001, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(self.music_gain * 0.06, t + 0.5)
            .ok();
        osc.start().ok();
        self.ambient = Some((osc, gain));
    }

    /// Stop the ambient drone
    pub fn stop_ambient(&mut self) {
        if let Some((osc, _)) = self.ambient.take() {
            osc.stop().ok();
        }
    }

    // === Sound generators ===

    /// Beneficial catch - bright blip
    fn play_catch(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 660.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(660.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(990.0, t + 0.08)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Harmful catch - dull buzz
    fn play_harmful(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 140.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(140.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(90.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }

    /// Explosion - boom!
    fn play_explosion(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 100.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.4)
            .ok();
        osc.frequency().set_value_at_time(100.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(30.0, t + 0.4)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.5).ok();

        // High frequency crack
        if let Some((osc2, gain2)) = create_osc(ctx, 1500.0, OscillatorType::Square) {
            gain2.gain().set_value_at_time(vol * 0.2, t).ok();
            gain2
                .gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc2.start().ok();
            osc2.stop_with_when(t + 0.15).ok();
        }
    }

    /// Explosive absorbed by immunity - soft tap
    fn play_blocked(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 300.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.05)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.08).ok();
    }

    /// Heal - rising chime
    fn play_heal(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [600.0, 800.0, 1000.0].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.2).ok();
            }
        }
    }

    /// Beneficial miss - ominous descend
    fn play_miss(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 300.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.35, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.5)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(60.0, t + 0.5)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.6).ok();
    }

    /// Ascending notes (level up, high score)
    fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, freqs: &[f32], step: f64) {
        for (i, freq) in freqs.iter().enumerate() {
            let delay = i as f64 * step;
            if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.28, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }

    /// Game over - sad descending
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            let delay = i as f64 * 0.2;
            if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}

impl EventSink for AudioManager {
    fn on_event(&mut self, event: &GameEvent) {
        if let Some(effect) = cue_for(event) {
            self.play(effect);
        }
        match ambient_for(event) {
            Some(Ambient::Start) => self.start_ambient(),
            Some(Ambient::Stop) => self.stop_ambient(),
            None => {}
        }
    }
}

/// Oscillator routed through a gain node to the destination
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    Some((osc, gain))
}
