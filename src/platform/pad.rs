//! Gamepad Backend
//!
//! Polls controllers through gilrs. Connected pads claim the first free
//! of four slots and keep it until they disconnect, so a pad's controller
//! index stays stable across frames. Event pumping happens inside
//! [`sample`](crate::platform::GamepadProvider::sample); draining an
//! already-empty gilrs queue is cheap, so every call pumps.

use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use log::{info, warn};

use crate::input::{apply_deadzone, PadButtons};
use crate::platform::{GamepadProvider, GamepadSample};
use crate::{PixeltoneError, Result};

/// Snapshot one pad's sticks and buttons
fn read_sample(gamepad: &gilrs::Gamepad<'_>) -> GamepadSample {
    let btn = |button: Button| -> bool { gamepad.is_pressed(button) };

    let mut buttons = PadButtons::empty();
    buttons.set(PadButtons::DPAD_UP, btn(Button::DPadUp));
    buttons.set(PadButtons::DPAD_DOWN, btn(Button::DPadDown));
    buttons.set(PadButtons::DPAD_LEFT, btn(Button::DPadLeft));
    buttons.set(PadButtons::DPAD_RIGHT, btn(Button::DPadRight));
    // Xbox layout: South=A, East=B, West=X, North=Y
    buttons.set(PadButtons::A, btn(Button::South));
    buttons.set(PadButtons::B, btn(Button::East));
    buttons.set(PadButtons::X, btn(Button::West));
    buttons.set(PadButtons::Y, btn(Button::North));
    // LeftTrigger/RightTrigger are the bumpers in gilrs naming
    buttons.set(PadButtons::LEFT_SHOULDER, btn(Button::LeftTrigger));
    buttons.set(PadButtons::RIGHT_SHOULDER, btn(Button::RightTrigger));
    buttons.set(PadButtons::START, btn(Button::Start));
    buttons.set(PadButtons::BACK, btn(Button::Select));

    GamepadSample {
        stick_x: apply_deadzone(gamepad.value(Axis::LeftStickX)),
        stick_y: apply_deadzone(gamepad.value(Axis::LeftStickY)),
        buttons,
    }
}

/// Controller provider backed by gilrs
pub struct GilrsGamepad {
    gilrs: Gilrs,
    slots: [Option<GamepadId>; 4],
}

impl GilrsGamepad {
    /// Initialize gamepad support and claim slots for pads already
    /// plugged in
    pub fn new() -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| {
            PixeltoneError::InputError(format!("Failed to initialize gamepad support: {e}"))
        })?;
        let mut pads = GilrsGamepad {
            gilrs,
            slots: [None; 4],
        };
        let connected: Vec<GamepadId> = pads.gilrs.gamepads().map(|(id, _)| id).collect();
        for id in connected {
            pads.assign_slot(id);
        }
        Ok(pads)
    }

    fn pump_events(&mut self) {
        while let Some(event) = self.gilrs.next_event() {
            match event.event {
                EventType::Connected => self.assign_slot(event.id),
                EventType::Disconnected => self.clear_slot(event.id),
                _ => {}
            }
        }
    }

    fn assign_slot(&mut self, id: GamepadId) {
        if self.slots.iter().any(|slot| *slot == Some(id)) {
            return;
        }
        if let Some(free) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *free = Some(id);
            info!("gamepad {id} connected");
        } else {
            warn!("gamepad {id} connected but every pad slot is taken");
        }
    }

    fn clear_slot(&mut self, id: GamepadId) {
        for slot in self.slots.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
                info!("gamepad {id} disconnected");
            }
        }
    }
}

impl GamepadProvider for GilrsGamepad {
    fn max_pads(&self) -> usize {
        self.slots.len()
    }

    fn sample(&mut self, pad: usize) -> Option<GamepadSample> {
        self.pump_events();
        let id = (*self.slots.get(pad)?)?;
        let gamepad = self.gilrs.gamepad(id);
        if !gamepad.is_connected() {
            return None;
        }
        Some(read_sample(&gamepad))
    }
}
