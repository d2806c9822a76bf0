//! Scalar Simulation
//!
//! The whole "game": a tone frequency and two gradient scroll offsets,
//! nudged by whichever controllers are active. Later slots win ties, and
//! the analog offset steps use truncating casts, so a stick only scrolls
//! at full deflection while the tone tracks it continuously.

use crate::input::{Button, FrameInput};

/// Resting tone frequency in Hz
pub const BASE_TONE_HZ: i32 = 256;
/// Tone swing applied by stick deflection or the move keys
pub const TONE_STEP_HZ: i32 = 128;
/// Gradient scroll per frame while a direction is held
pub const OFFSET_STEP: i32 = 10;

/// The persistent simulation scalars
#[derive(Debug, Clone, Copy)]
pub struct SimState {
    /// Current tone frequency in Hz, never below 1
    pub tone_hz: i32,
    /// Horizontal gradient scroll
    pub x_offset: i32,
    /// Vertical gradient scroll
    pub y_offset: i32,
}

impl SimState {
    /// Fresh state at the given tone
    pub fn new(tone_hz: i32) -> Self {
        SimState {
            tone_hz: tone_hz.max(1),
            x_offset: 0,
            y_offset: 0,
        }
    }

    /// Advance one frame from the polled input
    pub fn update(&mut self, input: &FrameInput) {
        for controller in &input.controllers {
            if controller.is_analog && controller.is_connected {
                self.tone_hz =
                    BASE_TONE_HZ + (TONE_STEP_HZ as f32 * controller.stick_x) as i32;
                self.x_offset = self
                    .x_offset
                    .wrapping_sub(OFFSET_STEP * controller.stick_x as i32);
                self.y_offset = self
                    .y_offset
                    .wrapping_add(OFFSET_STEP * controller.stick_y as i32);
            } else {
                if controller.button(Button::MoveLeft).ended_down {
                    self.tone_hz = BASE_TONE_HZ - TONE_STEP_HZ;
                    self.x_offset = self.x_offset.wrapping_sub(OFFSET_STEP);
                }
                if controller.button(Button::MoveRight).ended_down {
                    self.tone_hz = BASE_TONE_HZ + TONE_STEP_HZ;
                    self.x_offset = self.x_offset.wrapping_add(OFFSET_STEP);
                }
            }

            if controller.button(Button::ActionDown).ended_down {
                self.y_offset = self.y_offset.wrapping_add(OFFSET_STEP);
            }
        }

        // Guards the wave-period division downstream.
        self.tone_hz = self.tone_hz.max(1);
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new(BASE_TONE_HZ)
    }
}
