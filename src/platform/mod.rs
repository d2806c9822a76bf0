//! Backend Contracts
//!
//! The loop core talks to the outside world through four small traits:
//! an audio ring sink, a display, an event pump and a gamepad provider.
//! Each capability is resolved once at startup and handed to the
//! coordinator as a [`Platform`] bundle of trait references; the core
//! never knows which implementation it is driving.
//!
//! Implementations shipped here: [`headless`] (in-memory, tests and CI),
//! [`terminal`] (crossterm frontend, `terminal` feature), [`stream`]
//! (rodio sink, `streaming` feature) and [`pad`] (gilrs, `gamepad`
//! feature).

pub mod headless;
#[cfg(feature = "gamepad")]
pub mod pad;
#[cfg(feature = "streaming")]
pub mod stream;
#[cfg(feature = "terminal")]
pub mod terminal;

use crate::input::PadButtons;
use crate::video::VideoBuffer;
use crate::Result;

/// A client-area size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Hardware ring positions, refreshed once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursors {
    /// Byte offset currently being played, `[0, buffer_size)`
    pub play_cursor: usize,
    /// Byte offset safe to write from, `[0, buffer_size)`
    pub write_cursor: usize,
}

/// A locked span of the ring, split in two when it wraps.
///
/// Slices are interleaved left/right i16 samples; `second` is empty unless
/// the locked byte range ran past the end of the ring.
#[derive(Debug)]
pub struct AudioRegion<'a> {
    /// Samples from the lock offset to the wrap point (or the whole span)
    pub first: &'a mut [i16],
    /// Samples from the start of the ring when the span wrapped
    pub second: &'a mut [i16],
}

impl AudioRegion<'_> {
    /// Stereo pairs the whole region holds
    pub fn frames(&self) -> usize {
        (self.first.len() + self.second.len()) / 2
    }
}

/// Keys the loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
    Escape,
}

/// One drained window/input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The window (or terminal) wants the loop to quit
    CloseRequested,
    /// The client area changed size
    Resized(Dimensions),
    /// A key changed state
    Key {
        /// Which key
        key: Key,
        /// Down (`true`) or up (`false`)
        pressed: bool,
        /// Auto-repeat of a key already held
        repeat: bool,
    },
}

/// One gamepad's polled state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadSample {
    /// Left stick X in `[-1, 1]`, deadzone already applied
    pub stick_x: f32,
    /// Left stick Y in `[-1, 1]`, deadzone already applied
    pub stick_y: f32,
    /// Digital button levels
    pub buttons: PadButtons,
}

/// The looping audio ring buffer owned by the platform.
///
/// The five operations of the contract: construction opens the device,
/// [`cursors`](AudioSink::cursors) reports the hardware positions,
/// [`write_region`](AudioSink::write_region) is the lock/unlock pair as a
/// scoped write, and [`play_looping`](AudioSink::play_looping) starts
/// playback that wraps forever.
pub trait AudioSink {
    /// Ring capacity in bytes
    fn buffer_size(&self) -> usize;

    /// Current hardware play/write cursors.
    ///
    /// May fail transiently mid-stream; the loop skips audio for the frame
    /// and retries next frame.
    fn cursors(&mut self) -> Result<RingCursors>;

    /// Lock `byte_len` bytes starting at `byte_offset` and hand the
    /// writable region(s) to `fill`; the region is unlocked when `fill`
    /// returns.
    ///
    /// `byte_len` never exceeds the buffer size and both values arrive
    /// aligned to whole stereo frames. A span running past the end of the
    /// ring arrives as two regions.
    fn write_region(
        &mut self,
        byte_offset: usize,
        byte_len: usize,
        fill: &mut dyn FnMut(AudioRegion<'_>),
    ) -> Result<()>;

    /// Start (or keep) the ring playing end-to-end forever
    fn play_looping(&mut self) -> Result<()>;
}

/// Where video frames go
pub trait Display {
    /// Current client-area size in pixels
    fn client_dimensions(&self) -> Dimensions;

    /// Display refresh rate in Hz, when the backend knows one
    fn refresh_rate(&self) -> Option<u32>;

    /// Present a finished frame onto the client area
    fn blit(&mut self, frame: &VideoBuffer) -> Result<()>;
}

/// Non-blocking source of window and key events
pub trait EventPump {
    /// Next pending event, `None` once drained for this frame
    fn poll_event(&mut self) -> Option<PlatformEvent>;
}

/// Polled gamepad state provider
pub trait GamepadProvider {
    /// Pad slots this provider can report (0-based indices)
    fn max_pads(&self) -> usize;

    /// Poll one pad; `None` while disconnected
    fn sample(&mut self, pad: usize) -> Option<GamepadSample>;
}

/// The resolved backends handed to the coordinator each frame
pub struct Platform<'a> {
    /// Audio ring sink
    pub audio: &'a mut dyn AudioSink,
    /// Video output
    pub display: &'a mut dyn Display,
    /// Window/key event source
    pub events: &'a mut dyn EventPump,
    /// Controller source
    pub gamepad: &'a mut dyn GamepadProvider,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_frame_count_spans_the_wrap() {
        let mut first = [0i16; 6];
        let mut second = [0i16; 2];
        let region = AudioRegion {
            first: &mut first,
            second: &mut second,
        };
        assert_eq!(region.frames(), 4);
    }
}
