//! Frame Pacing
//!
//! Holds each loop iteration to a target wall-clock duration. A frame that
//! finishes early sleeps the remainder away (coarse sleep plus short
//! backoff naps near the deadline); a frame that overruns simply runs long,
//! with no frame skipping and no catch-up.

use std::time::{Duration, Instant};

/// Nap length while closing in on the frame deadline
pub const PACE_BACKOFF_MICROS: u64 = 100;

/// Margin left to the backoff naps after the coarse sleep
const COARSE_SLEEP_MARGIN: Duration = Duration::from_millis(2);

/// Wall-clock measurements for one completed frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTiming {
    /// Time spent working before the pacer was invoked
    pub work: Duration,
    /// Full frame duration including the paced wait
    pub total: Duration,
}

impl FrameTiming {
    /// Milliseconds per frame
    pub fn ms_per_frame(&self) -> f32 {
        self.total.as_secs_f32() * 1_000.0
    }

    /// Frames per second over this frame
    pub fn fps(&self) -> f32 {
        let secs = self.total.as_secs_f32();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }
}

/// Paces the loop to a fixed target frame duration
#[derive(Debug)]
pub struct FramePacer {
    target: Duration,
    frame_start: Instant,
}

impl FramePacer {
    /// Create a pacer; the first frame starts now
    pub fn new(target: Duration) -> Self {
        FramePacer {
            target,
            frame_start: Instant::now(),
        }
    }

    /// The target duration per frame
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Change the target for subsequent frames
    pub fn set_target(&mut self, target: Duration) {
        self.target = target;
    }

    /// Block until the frame budget elapses, then start the next frame.
    ///
    /// Returns the timing split of the frame that just ended. An overrun
    /// frame returns immediately with `work == total`.
    pub fn wait(&mut self) -> FrameTiming {
        let work = self.frame_start.elapsed();
        if work < self.target {
            let remaining = self.target - work;
            if remaining > COARSE_SLEEP_MARGIN {
                std::thread::sleep(remaining - COARSE_SLEEP_MARGIN);
            }
            while self.frame_start.elapsed() < self.target {
                std::thread::sleep(Duration::from_micros(PACE_BACKOFF_MICROS));
            }
        }
        let total = self.frame_start.elapsed();
        self.frame_start = Instant::now();
        FrameTiming { work, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_holds_the_frame_to_target() {
        let target = Duration::from_millis(10);
        let mut pacer = FramePacer::new(target);

        let timing = pacer.wait();
        assert!(timing.total >= target, "frame ended early: {:?}", timing.total);
        assert!(timing.work <= timing.total);
    }

    #[test]
    fn test_overrun_frame_returns_immediately() {
        let mut pacer = FramePacer::new(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));

        let before = Instant::now();
        let timing = pacer.wait();
        // Already over budget: no additional pacing sleep.
        assert!(before.elapsed() < Duration::from_millis(3));
        assert!(timing.total >= Duration::from_millis(5));
        assert!(timing.total - timing.work < Duration::from_millis(1));
    }

    #[test]
    fn test_timing_units() {
        let timing = FrameTiming {
            work: Duration::from_millis(4),
            total: Duration::from_millis(20),
        };
        assert!((timing.ms_per_frame() - 20.0).abs() < 0.01);
        assert!((timing.fps() - 50.0).abs() < 0.1);

        assert_eq!(FrameTiming::default().fps(), 0.0);
    }

    #[test]
    fn test_target_is_adjustable() {
        let mut pacer = FramePacer::new(Duration::from_millis(33));
        pacer.set_target(Duration::from_millis(16));
        assert_eq!(pacer.target(), Duration::from_millis(16));
    }
}
