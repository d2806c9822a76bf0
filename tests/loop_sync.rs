//! Integration tests for the frame loop.
//!
//! These drive a [`FrameCoordinator`] against the in-memory backends for
//! several frames and verify the loop-level properties: ring writes track
//! the play cursor without gaps or drift, cursor failures skip sound for
//! exactly one frame and reprime cleanly, and quit/resize events reach the
//! coordinator.

use pixeltone::platform::headless::{
    HeadlessAudio, HeadlessDisplay, HeadlessEvents, HeadlessGamepad,
};
use pixeltone::{Dimensions, FrameCoordinator, Key, LoopConfig, Platform, PlatformEvent};

/// Small, fast configuration: an 8 kHz ring and 1 ms frames so the pacer
/// barely sleeps.
fn test_config() -> LoopConfig {
    LoopConfig {
        samples_per_second: 8_000,
        default_fps: 1_000,
        video_width: 32,
        video_height: 18,
        ..LoopConfig::default()
    }
}

/// The four in-memory backends a coordinator needs, in one place so tests
/// can reborrow them as a [`Platform`] per call.
struct Rig {
    audio: HeadlessAudio,
    display: HeadlessDisplay,
    events: HeadlessEvents,
    pads: HeadlessGamepad,
}

impl Rig {
    fn new(config: &LoopConfig) -> Self {
        Rig {
            audio: HeadlessAudio::new(config),
            display: HeadlessDisplay::new(config.video_width, config.video_height),
            events: HeadlessEvents::new(),
            pads: HeadlessGamepad::new(),
        }
    }

    fn platform(&mut self) -> Platform<'_> {
        Platform {
            audio: &mut self.audio,
            display: &mut self.display,
            events: &mut self.events,
            gamepad: &mut self.pads,
        }
    }
}

/// Whether `point` lies inside the ring span of `len` bytes starting at
/// `start`.
fn in_ring_span(point: usize, start: usize, len: usize, size: usize) -> bool {
    (point + size - start) % size < len
}

#[test]
fn test_steady_state_writes_track_play_cursor() {
    // Full-rate geometry: 48 kHz ring, 256 Hz tone, one-fifteenth latency.
    // Only the fps cap is raised so the pacer barely sleeps.
    let config = LoopConfig {
        default_fps: 1_000,
        video_width: 32,
        video_height: 18,
        ..LoopConfig::default()
    };
    let latency_bytes = config.latency_sample_count() * 4;
    let buffer_size = config.secondary_buffer_size();
    // One 60 fps frame of samples at 48 kHz.
    let frame_samples = 800;

    let mut rig = Rig::new(&config);
    let mut coordinator = FrameCoordinator::new(config, &mut rig.platform()).unwrap();

    for _ in 0..5 {
        coordinator.step(&mut rig.platform()).unwrap();
        rig.audio.advance_play_samples(frame_samples);
    }

    // Record 0 is the startup clear; every later write is a planned window.
    let writes = rig.audio.writes();
    assert_eq!(writes.len(), 6, "one clear plus one window per frame");
    assert_eq!(writes[0].byte_len, buffer_size, "startup clear fills the ring");

    for (i, record) in writes.iter().enumerate().skip(1) {
        let end = (record.byte_offset + record.byte_len) % buffer_size;
        let target = (record.play_cursor + latency_bytes) % buffer_size;
        assert_eq!(end, target, "window {i} must end on the latency target");
        if i > 1 {
            let previous = &writes[i - 1];
            let previous_end = (previous.byte_offset + previous.byte_len) % buffer_size;
            assert_eq!(
                record.byte_offset, previous_end,
                "window {i} must start where window {} ended",
                i - 1
            );
        }

        // No window may touch the trailing latency span behind the play
        // cursor, which holds the audio queued for imminent playback.
        let forbidden_start = (record.play_cursor + buffer_size - latency_bytes) % buffer_size;
        for offset in 0..record.byte_len {
            let byte = (record.byte_offset + offset) % buffer_size;
            assert!(
                !in_ring_span(byte, forbidden_start, latency_bytes, buffer_size),
                "window {i} rewrote byte {byte} behind play cursor {}",
                record.play_cursor
            );
        }
    }

    // First frame fills the whole latency window, each later frame tops up
    // exactly what the play cursor consumed.
    let expected = config.latency_sample_count() as u64 + 4 * frame_samples as u64;
    assert_eq!(coordinator.samples_written(), expected);
}

#[test]
fn test_cursor_failure_skips_audio_and_reprimes() {
    let config = test_config();
    let mut rig = Rig::new(&config);
    let mut coordinator = FrameCoordinator::new(config, &mut rig.platform()).unwrap();

    coordinator.step(&mut rig.platform()).unwrap();
    assert!(coordinator.sound_valid());
    let writes_before = rig.audio.writes().len();

    // The cursor query fails for one frame: no write happens, video keeps
    // running, and the sound flag drops.
    rig.audio.advance_play_bytes(400);
    rig.audio.inject_cursor_failures(1);
    coordinator.step(&mut rig.platform()).unwrap();
    assert!(!coordinator.sound_valid(), "failed cursor query disables sound");
    assert_eq!(
        rig.audio.writes().len(),
        writes_before,
        "no ring write on a failed frame"
    );
    assert_eq!(rig.display.blit_count(), 2, "video still presents");
    assert!(coordinator.is_running());

    // Next frame reprimes the clock from the reported write cursor and
    // refills a full latency window from there.
    coordinator.step(&mut rig.platform()).unwrap();
    assert!(coordinator.sound_valid(), "sound recovers once cursors return");
    let latest = *rig.audio.writes().last().unwrap();
    assert_eq!(latest.byte_offset, 400, "refill starts at the write cursor");
    assert_eq!(latest.byte_len, config.latency_sample_count() * 4);
    assert_eq!(
        coordinator.samples_written(),
        100 + config.latency_sample_count() as u64,
        "clock repriming resets the running index to the write cursor"
    );
}

#[test]
fn test_escape_stops_the_loop() {
    let config = test_config();
    let mut rig = Rig::new(&config);
    let mut coordinator = FrameCoordinator::new(config, &mut rig.platform()).unwrap();

    rig.events.push(PlatformEvent::Key {
        key: Key::Escape,
        pressed: true,
        repeat: false,
    });
    coordinator.step(&mut rig.platform()).unwrap();

    assert!(!coordinator.is_running());
    assert_eq!(coordinator.frame_count(), 1, "the quitting frame still runs");
    assert_eq!(rig.display.blit_count(), 1);
}

#[test]
fn test_close_request_stops_the_loop() {
    let config = test_config();
    let mut rig = Rig::new(&config);
    let mut coordinator = FrameCoordinator::new(config, &mut rig.platform()).unwrap();

    coordinator.step(&mut rig.platform()).unwrap();
    assert!(coordinator.is_running());

    rig.events.push(PlatformEvent::CloseRequested);
    coordinator.step(&mut rig.platform()).unwrap();
    assert!(!coordinator.is_running());
}

#[test]
fn test_resize_reallocates_video_buffer() {
    let config = test_config();
    let mut rig = Rig::new(&config);
    let mut coordinator = FrameCoordinator::new(config, &mut rig.platform()).unwrap();

    rig.events.push(PlatformEvent::Resized(Dimensions {
        width: 160,
        height: 90,
    }));
    coordinator.step(&mut rig.platform()).unwrap();

    assert_eq!(coordinator.video().width(), 160);
    assert_eq!(coordinator.video().height(), 90);
    assert_eq!(
        rig.display.last_blit_dimensions(),
        Some(Dimensions {
            width: 160,
            height: 90
        }),
        "the resized buffer is what gets presented"
    );
}

#[test]
fn test_repeat_key_events_are_ignored() {
    let config = test_config();
    let mut rig = Rig::new(&config);
    let mut coordinator = FrameCoordinator::new(config, &mut rig.platform()).unwrap();

    // An OS auto-repeat of D must not move or retune anything.
    rig.events.push(PlatformEvent::Key {
        key: Key::D,
        pressed: true,
        repeat: true,
    });
    coordinator.step(&mut rig.platform()).unwrap();
    assert_eq!(coordinator.sim().tone_hz, 256);
    assert_eq!(coordinator.sim().x_offset, 0);

    // A genuine press does.
    rig.events.push(PlatformEvent::Key {
        key: Key::D,
        pressed: true,
        repeat: false,
    });
    coordinator.step(&mut rig.platform()).unwrap();
    assert_eq!(coordinator.sim().tone_hz, 384);
    assert_eq!(coordinator.sim().x_offset, 10);
}
