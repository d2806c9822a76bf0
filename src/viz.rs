//! Terminal Status Formatting
//!
//! Utilities for the demo's single-line status display: frame timing,
//! current tone and a fixed-width meter tracking the tone across its
//! reachable swing.

use std::fmt::Write;

use crate::pace::FrameTiming;
use crate::sim::{BASE_TONE_HZ, TONE_STEP_HZ};

/// Create a compact status line showing frame timing and tone state
///
/// Displays milliseconds per frame, frames per second, the current tone
/// frequency and whether sound output is live, in a single-line format
/// suitable for an in-place terminal update.
///
/// # Arguments
/// * `timing` - Timing of the most recent frame
/// * `tone_hz` - Current tone frequency in Hz
/// * `sound_valid` - Whether the audio ring accepted writes this frame
///
/// # Returns
/// A formatted status string
pub fn stats_line(timing: FrameTiming, tone_hz: i32, sound_valid: bool) -> String {
    let mut line = String::with_capacity(64);

    write!(
        line,
        "{:6.2} ms/f {:7.2} fps",
        timing.ms_per_frame(),
        timing.fps()
    )
    .ok();

    write!(line, " | tone {tone_hz:>4} Hz").ok();

    if sound_valid {
        write!(line, " | sound on ").ok();
    } else {
        write!(line, " | sound off").ok();
    }

    line
}

/// Create a Unicode block bar tracking the tone across its swing
///
/// Generates a fixed-width string with █ characters proportional to where
/// `tone_hz` sits between the lowest and highest tone the move keys and
/// stick can reach, padded with spaces to maintain consistent width.
///
/// # Arguments
/// * `tone_hz` - Current tone frequency in Hz
/// * `max_length` - Maximum bar length in characters (also the fixed output width)
///
/// # Returns
/// Fixed-width string of █ characters padded with spaces
pub fn tone_meter(tone_hz: i32, max_length: usize) -> String {
    let low = (BASE_TONE_HZ - TONE_STEP_HZ) as f32;
    let high = (BASE_TONE_HZ + TONE_STEP_HZ) as f32;
    let normalized = ((tone_hz as f32 - low) / (high - low)).clamp(0.0, 1.0);
    let block_count = (normalized * max_length as f32) as usize;
    let blocks = "█".repeat(block_count.min(max_length));
    let spaces = " ".repeat(max_length.saturating_sub(block_count));
    format!("{}{}", blocks, spaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stats_line_fields() {
        let timing = FrameTiming {
            work: Duration::from_millis(4),
            total: Duration::from_millis(16),
        };
        let line = stats_line(timing, 256, true);
        assert!(line.contains("ms/f"));
        assert!(line.contains("fps"));
        assert!(line.contains("tone  256 Hz"));
        assert!(line.contains("sound on"));
    }

    #[test]
    fn test_stats_line_reports_muted_sound() {
        let line = stats_line(FrameTiming::default(), 384, false);
        assert!(line.contains("sound off"));
    }

    #[test]
    fn test_tone_meter_width_is_fixed() {
        for tone in [0, 128, 256, 384, 10_000] {
            let bar = tone_meter(tone, 16);
            assert_eq!(bar.chars().count(), 16);
        }
    }

    #[test]
    fn test_tone_meter_tracks_the_swing() {
        assert_eq!(tone_meter(BASE_TONE_HZ - TONE_STEP_HZ, 8), "        ");
        assert_eq!(tone_meter(BASE_TONE_HZ, 8), "████    ");
        assert_eq!(tone_meter(BASE_TONE_HZ + TONE_STEP_HZ, 8), "████████");
    }

    #[test]
    fn test_tone_meter_clamps_out_of_range() {
        assert_eq!(tone_meter(-50, 4), "    ");
        assert_eq!(tone_meter(99_999, 4), "████");
    }
}
