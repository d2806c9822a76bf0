//! Edge-Detected Input State
//!
//! Per-button state with half-transition counts, five controller slots
//! (slot 0 is the keyboard, 1–4 are gamepads), and the old/new double
//! buffer the loop swaps every frame. Transitions are debounced here:
//! keyboard repeats are dropped by comparing against the current state,
//! gamepad buttons get one half-transition per observed flip per frame.

use bitflags::bitflags;

use crate::platform::{GamepadSample, Key};

/// Controller slots per frame: keyboard plus four gamepads
pub const MAX_CONTROLLERS: usize = 5;

/// XInput left-thumb deadzone as a fraction of full stick deflection
pub const STICK_DEADZONE: f32 = 7_849.0 / 32_768.0;

bitflags! {
    /// Raw digital-button word reported by a gamepad backend
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PadButtons: u16 {
        /// D-pad up
        const DPAD_UP = 0x0001;
        /// D-pad down
        const DPAD_DOWN = 0x0002;
        /// D-pad left
        const DPAD_LEFT = 0x0004;
        /// D-pad right
        const DPAD_RIGHT = 0x0008;
        /// Start button
        const START = 0x0010;
        /// Back/select button
        const BACK = 0x0020;
        /// Left bumper
        const LEFT_SHOULDER = 0x0100;
        /// Right bumper
        const RIGHT_SHOULDER = 0x0200;
        /// Bottom face button
        const A = 0x1000;
        /// Right face button
        const B = 0x2000;
        /// Left face button
        const X = 0x4000;
        /// Top face button
        const Y = 0x8000;
    }
}

/// Named digital buttons shared by keyboard and gamepad controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Move up (W, d-pad up)
    MoveUp,
    /// Move down (S, d-pad down)
    MoveDown,
    /// Move left (A, d-pad left)
    MoveLeft,
    /// Move right (D, d-pad right)
    MoveRight,
    /// Upper action (up arrow, Y)
    ActionUp,
    /// Lower action (down arrow, A)
    ActionDown,
    /// Left action (left arrow, X)
    ActionLeft,
    /// Right action (right arrow, B)
    ActionRight,
    /// Left bumper (Q)
    LeftShoulder,
    /// Right bumper (E)
    RightShoulder,
    /// Start (Enter)
    Start,
    /// Back (Space)
    Back,
}

impl Button {
    /// Number of named buttons
    pub const COUNT: usize = 12;

    /// Every named button, in slot order
    pub const ALL: [Button; Button::COUNT] = [
        Button::MoveUp,
        Button::MoveDown,
        Button::MoveLeft,
        Button::MoveRight,
        Button::ActionUp,
        Button::ActionDown,
        Button::ActionLeft,
        Button::ActionRight,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Start,
        Button::Back,
    ];

    /// The gamepad bit carrying this button
    fn pad_bit(self) -> PadButtons {
        match self {
            Button::MoveUp => PadButtons::DPAD_UP,
            Button::MoveDown => PadButtons::DPAD_DOWN,
            Button::MoveLeft => PadButtons::DPAD_LEFT,
            Button::MoveRight => PadButtons::DPAD_RIGHT,
            Button::ActionUp => PadButtons::Y,
            Button::ActionDown => PadButtons::A,
            Button::ActionLeft => PadButtons::X,
            Button::ActionRight => PadButtons::B,
            Button::LeftShoulder => PadButtons::LEFT_SHOULDER,
            Button::RightShoulder => PadButtons::RIGHT_SHOULDER,
            Button::Start => PadButtons::START,
            Button::Back => PadButtons::BACK,
        }
    }
}

/// Keyboard binding for the named button set.
///
/// Escape is deliberately absent: it quits the loop instead of mapping to
/// a button.
pub fn bind_key(key: Key) -> Option<Button> {
    match key {
        Key::W => Some(Button::MoveUp),
        Key::S => Some(Button::MoveDown),
        Key::A => Some(Button::MoveLeft),
        Key::D => Some(Button::MoveRight),
        Key::Up => Some(Button::ActionUp),
        Key::Down => Some(Button::ActionDown),
        Key::Left => Some(Button::ActionLeft),
        Key::Right => Some(Button::ActionRight),
        Key::Q => Some(Button::LeftShoulder),
        Key::E => Some(Button::RightShoulder),
        Key::Enter => Some(Button::Start),
        Key::Space => Some(Button::Back),
        Key::Escape => None,
    }
}

/// Deadzone filter for a normalized stick axis.
///
/// Values inside the deadzone collapse to zero; the remainder is rescaled
/// so output still spans the full `[-1, 1]`.
pub fn apply_deadzone(value: f32) -> f32 {
    let magnitude = value.abs();
    if magnitude < STICK_DEADZONE {
        0.0
    } else {
        let scaled = (magnitude - STICK_DEADZONE) / (1.0 - STICK_DEADZONE);
        value.signum() * scaled.min(1.0)
    }
}

/// One button's state at the end of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// State flips observed since the previous frame
    pub half_transition_count: u32,
    /// Whether the button is held as the frame ends
    pub ended_down: bool,
}

impl ButtonState {
    /// Apply a keyboard transition.
    ///
    /// Auto-repeat arrives as a redundant "pressed" while already down and
    /// is dropped, so the count reflects real flips only.
    pub fn apply_key(&mut self, pressed: bool) {
        if self.ended_down == pressed {
            return;
        }
        self.half_transition_count += 1;
        self.ended_down = pressed;
    }

    /// Fresh state from a sampled digital level.
    ///
    /// Gamepads are sampled once per frame, so at most one flip per frame
    /// can be observed.
    pub fn from_digital(previous: ButtonState, pressed: bool) -> ButtonState {
        ButtonState {
            half_transition_count: u32::from(previous.ended_down != pressed),
            ended_down: pressed,
        }
    }

    /// Whether the button went down during this frame
    pub fn just_pressed(&self) -> bool {
        self.ended_down && self.half_transition_count > 0
    }
}

/// One controller slot's state for a frame
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerInput {
    /// Whether a device currently backs this slot
    pub is_connected: bool,
    /// Whether the stick axes carry live analog values
    pub is_analog: bool,
    /// Left stick X, `[-1, 1]`, deadzone already applied
    pub stick_x: f32,
    /// Left stick Y, `[-1, 1]`, deadzone already applied
    pub stick_y: f32,
    buttons: [ButtonState; Button::COUNT],
}

impl ControllerInput {
    /// State of one named button
    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons[button as usize]
    }

    /// Mutable state of one named button
    pub fn button_mut(&mut self, button: Button) -> &mut ButtonState {
        &mut self.buttons[button as usize]
    }

    /// Overwrite this slot from a gamepad sample, deriving edge counts
    /// against the previous frame's slot.
    pub fn apply_gamepad(&mut self, previous: &ControllerInput, sample: &GamepadSample) {
        self.is_connected = true;
        self.is_analog = true;
        self.stick_x = sample.stick_x;
        self.stick_y = sample.stick_y;
        for button in Button::ALL {
            self.buttons[button as usize] = ButtonState::from_digital(
                previous.button(button),
                sample.buttons.contains(button.pad_bit()),
            );
        }
    }
}

/// All controller slots for one frame.
///
/// The loop keeps two of these and swaps them: the new frame starts with
/// [`begin_frame`](FrameInput::begin_frame), which clears the keyboard
/// slot's transition counts while carrying its held state forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    /// Slot 0 = keyboard, slots 1–4 = gamepads
    pub controllers: [ControllerInput; MAX_CONTROLLERS],
}

impl FrameInput {
    /// The keyboard slot
    pub fn keyboard(&self) -> &ControllerInput {
        &self.controllers[0]
    }

    /// The keyboard slot, mutable
    pub fn keyboard_mut(&mut self) -> &mut ControllerInput {
        &mut self.controllers[0]
    }

    /// Start a new frame from the previous one.
    ///
    /// The keyboard slot is zeroed, marked connected, and each button's
    /// `ended_down` is carried over so held keys stay held; transition
    /// counts restart at zero. Gamepad slots are left for the sampler to
    /// overwrite.
    pub fn begin_frame(&mut self, previous: &FrameInput) {
        let keyboard = self.keyboard_mut();
        *keyboard = ControllerInput::default();
        keyboard.is_connected = true;
        for button in Button::ALL {
            keyboard.button_mut(button).ended_down =
                previous.keyboard().button(button).ended_down;
        }
    }

    /// Route a key transition into the keyboard slot
    pub fn apply_key(&mut self, key: Key, pressed: bool) {
        if let Some(button) = bind_key(key) {
            self.keyboard_mut().button_mut(button).apply_key(pressed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_transitions_are_counted_once_per_flip() {
        let mut state = ButtonState::default();

        state.apply_key(true);
        assert!(state.ended_down);
        assert_eq!(state.half_transition_count, 1);
        assert!(state.just_pressed());

        // Auto-repeat: redundant press while held changes nothing.
        state.apply_key(true);
        assert_eq!(state.half_transition_count, 1);

        state.apply_key(false);
        assert!(!state.ended_down);
        assert_eq!(state.half_transition_count, 2);
        assert!(!state.just_pressed());
    }

    #[test]
    fn test_tap_within_one_frame_keeps_both_edges() {
        let mut state = ButtonState::default();
        state.apply_key(true);
        state.apply_key(false);
        assert_eq!(state.half_transition_count, 2);
        assert!(!state.ended_down);
    }

    #[test]
    fn test_digital_edges() {
        let up = ButtonState::from_digital(ButtonState::default(), true);
        assert!(up.ended_down);
        assert_eq!(up.half_transition_count, 1);

        let held = ButtonState::from_digital(up, true);
        assert!(held.ended_down);
        assert_eq!(held.half_transition_count, 0);

        let released = ButtonState::from_digital(held, false);
        assert!(!released.ended_down);
        assert_eq!(released.half_transition_count, 1);
    }

    #[test]
    fn test_begin_frame_carries_held_keys() {
        let mut previous = FrameInput::default();
        previous.apply_key(Key::W, true);
        previous.apply_key(Key::Q, true);
        previous.apply_key(Key::Q, false);

        let mut next = FrameInput::default();
        next.begin_frame(&previous);

        let keyboard = next.keyboard();
        assert!(keyboard.is_connected);
        assert!(keyboard.button(Button::MoveUp).ended_down);
        assert_eq!(keyboard.button(Button::MoveUp).half_transition_count, 0);
        assert!(!keyboard.button(Button::LeftShoulder).ended_down);
    }

    #[test]
    fn test_gamepad_sample_application() {
        let previous = ControllerInput::default();
        let sample = GamepadSample {
            stick_x: 0.5,
            stick_y: -1.0,
            buttons: PadButtons::A | PadButtons::DPAD_LEFT,
        };

        let mut slot = ControllerInput::default();
        slot.apply_gamepad(&previous, &sample);

        assert!(slot.is_connected && slot.is_analog);
        assert_eq!(slot.stick_x, 0.5);
        assert!(slot.button(Button::ActionDown).just_pressed());
        assert!(slot.button(Button::MoveLeft).just_pressed());
        assert!(!slot.button(Button::Start).ended_down);

        // Holding: levels persist, edges stop counting.
        let held_from = slot;
        slot.apply_gamepad(&held_from, &sample);
        assert!(slot.button(Button::ActionDown).ended_down);
        assert_eq!(slot.button(Button::ActionDown).half_transition_count, 0);
    }

    #[test]
    fn test_deadzone_collapses_and_rescales() {
        assert_eq!(apply_deadzone(0.0), 0.0);
        assert_eq!(apply_deadzone(0.1), 0.0);
        assert_eq!(apply_deadzone(-0.2), 0.0);
        assert_eq!(apply_deadzone(1.0), 1.0);
        assert_eq!(apply_deadzone(-1.0), -1.0);

        let half = apply_deadzone(0.6);
        assert!(half > 0.0 && half < 0.6);
        assert_eq!(apply_deadzone(-0.6), -half);
    }

    #[test]
    fn test_escape_is_not_a_button() {
        assert_eq!(bind_key(Key::Escape), None);
        assert_eq!(bind_key(Key::W), Some(Button::MoveUp));
        assert_eq!(bind_key(Key::Left), Some(Button::ActionLeft));
    }
}
