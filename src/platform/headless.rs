//! In-memory backends.
//!
//! These back the test suite and the demo's `--headless` mode: the audio
//! ring is a plain `Vec<i16>` whose play cursor moves only when the caller
//! advances it, the display counts blits, and events/gamepad state are
//! queues the caller fills by hand. Everything the real backends report is
//! scriptable here, including transient cursor-query failures.

use std::collections::VecDeque;

use crate::config::LoopConfig;
use crate::platform::{
    AudioRegion, AudioSink, Dimensions, Display, EventPump, GamepadProvider, GamepadSample,
    PlatformEvent, RingCursors,
};
use crate::video::VideoBuffer;
use crate::{PixeltoneError, Result};

/// One recorded `write_region` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    /// Play cursor at the moment of the lock
    pub play_cursor: usize,
    /// Byte offset the write started at
    pub byte_offset: usize,
    /// Bytes written
    pub byte_len: usize,
}

/// An audio ring that lives in a `Vec` and moves only on request
pub struct HeadlessAudio {
    ring: Vec<i16>,
    buffer_size: usize,
    play_cursor: usize,
    write_margin: usize,
    playing: bool,
    pending_cursor_failures: u32,
    writes: Vec<WriteRecord>,
}

impl HeadlessAudio {
    /// Ring sized from `config`, cursors at zero, stopped
    pub fn new(config: &LoopConfig) -> Self {
        let buffer_size = config.secondary_buffer_size();
        Self {
            ring: vec![0; buffer_size / 2],
            buffer_size,
            play_cursor: 0,
            write_margin: 0,
            playing: false,
            pending_cursor_failures: 0,
            writes: Vec::new(),
        }
    }

    /// Move the play cursor forward by whole stereo frames
    pub fn advance_play_samples(&mut self, samples: usize) {
        self.advance_play_bytes(samples * 4);
    }

    /// Move the play cursor forward by `bytes`, wrapping at the ring end
    pub fn advance_play_bytes(&mut self, bytes: usize) {
        self.play_cursor = (self.play_cursor + bytes) % self.buffer_size;
    }

    /// Report a write cursor `bytes` ahead of the play cursor
    pub fn set_write_margin(&mut self, bytes: usize) {
        self.write_margin = bytes;
    }

    /// Make the next `count` cursor queries fail
    pub fn inject_cursor_failures(&mut self, count: u32) {
        self.pending_cursor_failures = count;
    }

    /// Whether `play_looping` has been called
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The ring contents as interleaved stereo samples
    pub fn ring(&self) -> &[i16] {
        &self.ring
    }

    /// Every write made so far, oldest first
    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }
}

impl AudioSink for HeadlessAudio {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn cursors(&mut self) -> Result<RingCursors> {
        if self.pending_cursor_failures > 0 {
            self.pending_cursor_failures -= 1;
            return Err(PixeltoneError::AudioDeviceError(
                "cursor query failed".to_string(),
            ));
        }
        Ok(RingCursors {
            play_cursor: self.play_cursor,
            write_cursor: (self.play_cursor + self.write_margin) % self.buffer_size,
        })
    }

    fn write_region(
        &mut self,
        byte_offset: usize,
        byte_len: usize,
        fill: &mut dyn FnMut(AudioRegion<'_>),
    ) -> Result<()> {
        debug_assert_eq!(byte_offset % 4, 0);
        debug_assert_eq!(byte_len % 4, 0);
        debug_assert!(byte_len <= self.buffer_size);
        self.writes.push(WriteRecord {
            play_cursor: self.play_cursor,
            byte_offset,
            byte_len,
        });
        let start = byte_offset / 2;
        let len = byte_len / 2;
        if start + len <= self.ring.len() {
            fill(AudioRegion {
                first: &mut self.ring[start..start + len],
                second: &mut [],
            });
        } else {
            let wrapped = start + len - self.ring.len();
            let (head, tail) = self.ring.split_at_mut(start);
            fill(AudioRegion {
                first: tail,
                second: &mut head[..wrapped],
            });
        }
        Ok(())
    }

    fn play_looping(&mut self) -> Result<()> {
        self.playing = true;
        Ok(())
    }
}

/// A display that only counts what it is shown
pub struct HeadlessDisplay {
    dimensions: Dimensions,
    refresh_rate: Option<u32>,
    blit_count: u64,
    last_blit: Option<Dimensions>,
}

impl HeadlessDisplay {
    /// A display reporting a fixed client area and no refresh rate
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dimensions: Dimensions { width, height },
            refresh_rate: None,
            blit_count: 0,
            last_blit: None,
        }
    }

    /// Change the reported client area
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.dimensions = Dimensions { width, height };
    }

    /// Change the reported refresh rate
    pub fn set_refresh_rate(&mut self, rate: Option<u32>) {
        self.refresh_rate = rate;
    }

    /// Frames blitted so far
    pub fn blit_count(&self) -> u64 {
        self.blit_count
    }

    /// Size of the most recently blitted frame
    pub fn last_blit_dimensions(&self) -> Option<Dimensions> {
        self.last_blit
    }
}

impl Display for HeadlessDisplay {
    fn client_dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn refresh_rate(&self) -> Option<u32> {
        self.refresh_rate
    }

    fn blit(&mut self, frame: &VideoBuffer) -> Result<()> {
        self.blit_count += 1;
        self.last_blit = Some(Dimensions {
            width: frame.width() as u32,
            height: frame.height() as u32,
        });
        Ok(())
    }
}

/// An event pump fed by hand
#[derive(Default)]
pub struct HeadlessEvents {
    queue: VecDeque<PlatformEvent>,
}

impl HeadlessEvents {
    /// An empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next drain
    pub fn push(&mut self, event: PlatformEvent) {
        self.queue.push_back(event);
    }
}

impl EventPump for HeadlessEvents {
    fn poll_event(&mut self) -> Option<PlatformEvent> {
        self.queue.pop_front()
    }
}

/// Gamepad slots whose state is set by hand
pub struct HeadlessGamepad {
    slots: [Option<GamepadSample>; 4],
}

impl HeadlessGamepad {
    /// Four slots, all disconnected
    pub fn new() -> Self {
        Self { slots: [None; 4] }
    }

    /// Connect (`Some`) or disconnect (`None`) one slot; slots past
    /// [`max_pads`](GamepadProvider::max_pads) are ignored
    pub fn set_sample(&mut self, pad: usize, sample: Option<GamepadSample>) {
        if let Some(slot) = self.slots.get_mut(pad) {
            *slot = sample;
        }
    }
}

impl Default for HeadlessGamepad {
    fn default() -> Self {
        Self::new()
    }
}

impl GamepadProvider for HeadlessGamepad {
    fn max_pads(&self) -> usize {
        self.slots.len()
    }

    fn sample(&mut self, pad: usize) -> Option<GamepadSample> {
        self.slots.get(pad).copied().flatten()
    }
}
