//! Loop Configuration
//!
//! The fixed constants of the loop: sample format, ring geometry, latency
//! margin, pacing cap and initial video dimensions. Serializable so the
//! demo can load overrides from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Default output rate in Hz
pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 48_000;

/// Bytes per stereo i16 sample pair
pub const BYTES_PER_SAMPLE: usize = 4;

/// Configuration for the frame loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Audio output rate in Hz
    pub samples_per_second: u32,

    /// Initial tone frequency in Hz
    pub tone_hz: i32,

    /// Peak tone amplitude (i16 full scale is 32767)
    pub tone_volume: f32,

    /// Latency as a fraction of a second: the look-ahead window holds
    /// `samples_per_second / latency_divisor` samples.
    /// Larger divisor = less latency but less slack against a long frame.
    pub latency_divisor: u32,

    /// Frame-rate cap applied on top of the display refresh rate
    pub default_fps: u32,

    /// Initial video buffer width when no display dictates one
    pub video_width: u32,

    /// Initial video buffer height when no display dictates one
    pub video_height: u32,
}

impl LoopConfig {
    /// Configuration with a tighter look-ahead window
    /// (≈ 33ms @ 48kHz, divisor 30)
    pub fn low_latency() -> Self {
        LoopConfig {
            latency_divisor: 30,
            ..Self::default()
        }
    }

    /// Configuration with a roomier look-ahead window
    /// (≈ 100ms @ 48kHz, divisor 10)
    pub fn stable() -> Self {
        LoopConfig {
            latency_divisor: 10,
            ..Self::default()
        }
    }

    /// Ring capacity in bytes: exactly one second of output
    pub fn secondary_buffer_size(&self) -> usize {
        self.samples_per_second as usize * BYTES_PER_SAMPLE
    }

    /// Look-ahead window size in samples
    pub fn latency_sample_count(&self) -> usize {
        (self.samples_per_second / self.latency_divisor.max(1)) as usize
    }

    /// Look-ahead latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.latency_sample_count() as f32 / self.samples_per_second as f32) * 1_000.0
    }

    /// Target duration of one frame.
    ///
    /// Derived from the display refresh rate capped at `default_fps`; a
    /// display that reports no refresh rate gets the cap alone.
    pub fn target_frame_duration(&self, refresh_rate: Option<u32>) -> Duration {
        let cap = self.default_fps.max(1);
        let fps = match refresh_rate {
            Some(rate) if rate >= 1 => rate.min(cap),
            _ => cap,
        };
        Duration::from_secs_f64(1.0 / fps as f64)
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: LoopConfig = serde_json::from_str(&text)
            .map_err(|e| crate::PixeltoneError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometries the planner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_second == 0 {
            return Err(crate::PixeltoneError::ConfigError(
                "samples_per_second must be positive".into(),
            ));
        }
        if self.latency_divisor == 0 {
            return Err(crate::PixeltoneError::ConfigError(
                "latency_divisor must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
            tone_hz: 256,
            tone_volume: 3_000.0,
            latency_divisor: 15,
            default_fps: 60,
            video_width: 960,
            video_height: 540,
        }
    }
}
