//! Sample-Accurate Stream Position
//!
//! Tracks how many audio samples have been committed to the ring buffer.

/// Free-running counter of samples written to the audio ring.
///
/// The counter only ever increases while the stream is valid, once per
/// sample actually written. Its sole consumer is the ring offset derived
/// by [`ring_offset`](SampleClock::ring_offset); after a transient device
/// failure it is re-primed from the hardware write cursor, which starts a
/// new validity epoch.
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    /// Samples committed since stream start (or since the last re-prime)
    running_sample_idx: u64,
}

impl SampleClock {
    /// Create a clock at stream start
    pub fn new() -> Self {
        SampleClock {
            running_sample_idx: 0,
        }
    }

    /// Count committed samples, one increment per sample written
    pub fn advance(&mut self, samples: u64) {
        self.running_sample_idx += samples;
    }

    /// Get the total samples committed in the current epoch
    pub fn samples_written(&self) -> u64 {
        self.running_sample_idx
    }

    /// Byte offset into the ring implied by the current count.
    ///
    /// `buffer_size` must be a whole number of samples; the returned offset
    /// is always sample-aligned and in `[0, buffer_size)`.
    pub fn ring_offset(&self, bytes_per_sample: usize, buffer_size: usize) -> usize {
        debug_assert!(bytes_per_sample > 0 && buffer_size % bytes_per_sample == 0);
        let ring_samples = (buffer_size / bytes_per_sample) as u64;
        (self.running_sample_idx % ring_samples) as usize * bytes_per_sample
    }

    /// Restart the count from a hardware-reported write cursor.
    ///
    /// Used when audio was marked invalid after a cursor failure: the next
    /// plan starts exactly where the hardware says writing is safe.
    pub fn reprime(&mut self, write_cursor: usize, bytes_per_sample: usize) {
        debug_assert!(bytes_per_sample > 0 && write_cursor % bytes_per_sample == 0);
        self.running_sample_idx = (write_cursor / bytes_per_sample) as u64;
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_monotonically() {
        let mut clock = SampleClock::new();
        assert_eq!(clock.samples_written(), 0);

        clock.advance(1);
        assert_eq!(clock.samples_written(), 1);

        clock.advance(99);
        assert_eq!(clock.samples_written(), 100);
    }

    #[test]
    fn test_ring_offset_wraps() {
        let mut clock = SampleClock::new();
        // One-second ring at 48 kHz stereo i16: 48000 samples of 4 bytes.
        clock.advance(47_999);
        assert_eq!(clock.ring_offset(4, 48_000 * 4), 47_999 * 4);

        clock.advance(1);
        assert_eq!(clock.ring_offset(4, 48_000 * 4), 0);

        clock.advance(100);
        assert_eq!(clock.ring_offset(4, 48_000 * 4), 400);
    }

    #[test]
    fn test_reprime_restarts_epoch_at_write_cursor() {
        let mut clock = SampleClock::new();
        clock.advance(10_000);

        clock.reprime(640, 4);
        assert_eq!(clock.samples_written(), 160);
        assert_eq!(clock.ring_offset(4, 48_000 * 4), 640);
    }
}
