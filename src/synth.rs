//! Tone Synthesis
//!
//! Phase-accumulator sine generator emitting signed 16-bit stereo pairs.
//! The phase persists across calls so successive ring fills stay
//! phase-continuous regardless of how the planned windows split them.

use std::f32::consts::TAU;

/// Phase-continuous sine tone generator.
///
/// Produces exactly the requested number of `(left, right)` sample pairs
/// per call, mono duplicated to stereo. The wave period is kept in floating
/// point throughout and the phase is wrapped modulo 2π every step to bound
/// floating error over long runs.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    samples_per_second: u32,
    tone_hz: f32,
    volume: f32,
    /// Phase accumulator in radians, `[0, 2π)`
    phase: f32,
}

impl ToneSynthesizer {
    /// Create a generator at the given output rate, frequency and amplitude
    pub fn new(samples_per_second: u32, tone_hz: f32, volume: f32) -> Self {
        debug_assert!(samples_per_second > 0);
        ToneSynthesizer {
            samples_per_second,
            tone_hz: tone_hz.max(1.0),
            volume,
            phase: 0.0,
        }
    }

    /// Change the tone frequency.
    ///
    /// Takes effect for samples generated after the call; already emitted
    /// samples are never resampled and no ramp is applied, so an audible
    /// step in the waveform slope is expected on large changes.
    pub fn set_tone_hz(&mut self, tone_hz: f32) {
        self.tone_hz = tone_hz.max(1.0);
    }

    /// Current tone frequency in Hz
    pub fn tone_hz(&self) -> f32 {
        self.tone_hz
    }

    /// Change the peak amplitude (i16 full scale is 32767)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Current peak amplitude
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Current phase in radians
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Generate one stereo pair and advance the phase
    #[inline]
    pub fn next_pair(&mut self) -> (i16, i16) {
        let sample = (self.phase.sin() * self.volume).round() as i16;
        let wave_period = self.samples_per_second as f32 / self.tone_hz;
        self.phase = (self.phase + TAU / wave_period) % TAU;
        (sample, sample)
    }

    /// Fill an interleaved left/right buffer.
    ///
    /// `out.len()` must be even; each pair of slots receives one generated
    /// sample duplicated to both channels.
    pub fn fill_interleaved(&mut self, out: &mut [i16]) {
        debug_assert!(out.len() % 2 == 0, "interleaved buffer must hold whole pairs");
        for pair in out.chunks_exact_mut(2) {
            let (left, right) = self.next_pair();
            pair[0] = left;
            pair[1] = right;
        }
    }

    /// Produce exactly `count` stereo pairs.
    ///
    /// `count = 0` is a no-op and leaves the phase untouched.
    pub fn produce(&mut self, count: usize) -> Vec<(i16, i16)> {
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            pairs.push(self.next_pair());
        }
        pairs
    }
}
