//! Ring-Window Planning
//!
//! Computes, once per frame, the byte range of the looping audio ring that
//! is safe to overwrite: from the position implied by the free-running
//! sample counter up to a target latency ahead of the hardware play cursor.
//! The window never rewrites bytes behind the play cursor and never exceeds
//! one full buffer revolution.

/// A byte range of the ring to fill this frame.
///
/// `byte_to_lock` is where writing starts; `bytes_to_write` may wrap past
/// the end of the ring, in which case the backend hands out two regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWindow {
    /// Start offset of the window, in bytes, `[0, buffer_size)`
    pub byte_to_lock: usize,
    /// Window length in bytes, `<= buffer_size`
    pub bytes_to_write: usize,
}

impl PlannedWindow {
    /// Whether there is nothing to write this frame
    pub fn is_empty(&self) -> bool {
        self.bytes_to_write == 0
    }
}

/// Per-frame planner for the safe write window.
///
/// Holds the fixed ring geometry plus a one-time `primed` flag: the
/// "cursors coincide, fill the whole buffer" case is only valid at stream
/// start, before any cursor feedback exists. Once a plan has been produced
/// the same coincidence means "legitimately caught up" and plans zero
/// bytes instead of a destructive full rewrite mid-stream.
#[derive(Debug, Clone)]
pub struct RingWindowPlanner {
    bytes_per_sample: usize,
    buffer_size: usize,
    latency_samples: usize,
    primed: bool,
}

impl RingWindowPlanner {
    /// Create a planner for a ring of `buffer_size` bytes.
    ///
    /// `buffer_size` must be a whole number of samples and the latency
    /// window must fit inside the ring.
    pub fn new(bytes_per_sample: usize, buffer_size: usize, latency_samples: usize) -> Self {
        debug_assert!(bytes_per_sample > 0);
        debug_assert!(buffer_size % bytes_per_sample == 0);
        debug_assert!(latency_samples * bytes_per_sample <= buffer_size);
        RingWindowPlanner {
            bytes_per_sample,
            buffer_size,
            latency_samples,
            primed: false,
        }
    }

    /// The look-ahead margin in bytes
    pub fn latency_bytes(&self) -> usize {
        self.latency_samples * self.bytes_per_sample
    }

    /// Whether at least one plan has been produced since stream start
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Compute the window to fill this frame.
    ///
    /// `play_cursor` is the hardware-reported byte offset currently being
    /// played; `running_sample_idx` is the committed-sample count from
    /// [`SampleClock`](crate::SampleClock). The window starts at the byte
    /// implied by the counter and ends at
    /// `target_cursor = (play_cursor + latency_bytes) mod buffer_size`.
    pub fn plan(&mut self, play_cursor: usize, running_sample_idx: u64) -> PlannedWindow {
        debug_assert!(play_cursor < self.buffer_size);

        let ring_samples = (self.buffer_size / self.bytes_per_sample) as u64;
        let byte_to_lock =
            (running_sample_idx % ring_samples) as usize * self.bytes_per_sample;
        let target_cursor = (play_cursor + self.latency_bytes()) % self.buffer_size;

        let bytes_to_write = if byte_to_lock == target_cursor {
            // Coinciding cursors: prime the whole ring exactly once, at
            // stream start. Afterwards this means "caught up", not "empty".
            if self.primed {
                0
            } else {
                self.buffer_size
            }
        } else if byte_to_lock > target_cursor {
            (self.buffer_size - byte_to_lock) + target_cursor
        } else {
            target_cursor - byte_to_lock
        };
        self.primed = true;

        PlannedWindow {
            byte_to_lock,
            bytes_to_write,
        }
    }
}
