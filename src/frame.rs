//! Frame Coordinator
//!
//! One `step` is one frame: drain events into fresh input, advance the
//! simulation, plan and fill the audio window, render and present the
//! video buffer, then hold the frame to the pacing target. The
//! coordinator owns the loop state (sample clock, planner, synthesizer,
//! video buffer, simulation, input double buffer) and borrows the
//! platform backends only for the duration of each call.
//!
//! Audio failures are absorbed: a failed cursor query or region write
//! skips sound for that frame and flags the sample clock for repriming,
//! so the stream rejoins the hardware ring at the reported write cursor
//! on the next healthy frame. Video failures are fatal.

use std::mem;

use log::{debug, info, warn};

use crate::clock::SampleClock;
use crate::config::{LoopConfig, BYTES_PER_SAMPLE};
use crate::input::{ControllerInput, FrameInput, MAX_CONTROLLERS};
use crate::pace::{FramePacer, FrameTiming};
use crate::platform::{Key, Platform, PlatformEvent};
use crate::ring::RingWindowPlanner;
use crate::sim::SimState;
use crate::synth::ToneSynthesizer;
use crate::video::VideoBuffer;
use crate::Result;

/// Owns one real-time loop: simulation, synthesis, planning and pacing
pub struct FrameCoordinator {
    config: LoopConfig,
    clock: SampleClock,
    planner: RingWindowPlanner,
    synth: ToneSynthesizer,
    video: VideoBuffer,
    sim: SimState,
    pacer: FramePacer,
    input_old: FrameInput,
    input_new: FrameInput,
    sound_valid: bool,
    running: bool,
    frame_count: u64,
    last_timing: FrameTiming,
}

impl FrameCoordinator {
    /// Validate `config`, size the video buffer from the display, clear
    /// the audio ring to silence and start looping playback.
    ///
    /// A display reporting a zero-sized client area falls back to the
    /// configured video dimensions. An unknown refresh rate paces at the
    /// configured cap.
    pub fn new(config: LoopConfig, platform: &mut Platform<'_>) -> Result<Self> {
        config.validate()?;

        let dims = platform.display.client_dimensions();
        let (width, height) = if dims.width == 0 || dims.height == 0 {
            (config.video_width, config.video_height)
        } else {
            (dims.width, dims.height)
        };
        let video = VideoBuffer::new(width, height);

        let refresh = platform.display.refresh_rate();
        if refresh.is_none() {
            warn!(
                "display refresh rate unknown, pacing at the {} fps cap",
                config.default_fps
            );
        }
        let pacer = FramePacer::new(config.target_frame_duration(refresh));

        let buffer_size = config.secondary_buffer_size();
        platform.audio.write_region(0, buffer_size, &mut |region| {
            region.first.fill(0);
            region.second.fill(0);
        })?;
        platform.audio.play_looping()?;

        info!(
            "loop start: {} Hz audio, {} byte ring, {:.1} ms latency, {}x{} video, {:.1} fps target",
            config.samples_per_second,
            buffer_size,
            config.latency_ms(),
            width,
            height,
            1.0 / pacer.target().as_secs_f64(),
        );

        Ok(Self {
            clock: SampleClock::new(),
            planner: RingWindowPlanner::new(
                BYTES_PER_SAMPLE,
                buffer_size,
                config.latency_sample_count(),
            ),
            synth: ToneSynthesizer::new(
                config.samples_per_second,
                config.tone_hz as f32,
                config.tone_volume,
            ),
            video,
            sim: SimState::new(config.tone_hz),
            pacer,
            input_old: FrameInput::default(),
            input_new: FrameInput::default(),
            sound_valid: false,
            running: true,
            frame_count: 0,
            last_timing: FrameTiming::default(),
            config,
        })
    }

    /// Run one frame and return its timing
    pub fn step(&mut self, platform: &mut Platform<'_>) -> Result<FrameTiming> {
        self.poll_input(platform);

        self.sim.update(&self.input_new);
        self.synth.set_tone_hz(self.sim.tone_hz as f32);

        self.submit_audio(platform);

        self.video.render_gradient(self.sim.x_offset, self.sim.y_offset);
        platform.display.blit(&self.video)?;

        mem::swap(&mut self.input_old, &mut self.input_new);
        self.frame_count += 1;

        let timing = self.pacer.wait();
        self.last_timing = timing;
        debug!("{:.2} ms/f\t{:.2} fps", timing.ms_per_frame(), timing.fps());
        Ok(timing)
    }

    /// Step until something asks the loop to quit
    pub fn run(&mut self, platform: &mut Platform<'_>) -> Result<()> {
        while self.running {
            self.step(platform)?;
        }
        info!("loop stopped after {} frames", self.frame_count);
        Ok(())
    }

    fn poll_input(&mut self, platform: &mut Platform<'_>) {
        self.input_new.begin_frame(&self.input_old);

        while let Some(event) = platform.events.poll_event() {
            match event {
                PlatformEvent::CloseRequested => {
                    info!("close requested");
                    self.running = false;
                }
                PlatformEvent::Resized(dims) => {
                    if self.video.resize(dims.width, dims.height) {
                        debug!("video buffer resized to {}x{}", dims.width, dims.height);
                    }
                }
                PlatformEvent::Key { repeat: true, .. } => {}
                PlatformEvent::Key {
                    key: Key::Escape,
                    pressed,
                    ..
                } => {
                    if pressed {
                        self.running = false;
                    }
                }
                PlatformEvent::Key { key, pressed, .. } => {
                    self.input_new.apply_key(key, pressed);
                }
            }
        }

        let pads = platform.gamepad.max_pads().min(MAX_CONTROLLERS - 1);
        for pad in 0..pads {
            let slot = pad + 1;
            let previous = self.input_old.controllers[slot];
            match platform.gamepad.sample(pad) {
                Some(sample) => {
                    self.input_new.controllers[slot].apply_gamepad(&previous, &sample);
                }
                None => self.input_new.controllers[slot] = ControllerInput::default(),
            }
        }
    }

    /// Plan this frame's ring window and fill it from the synthesizer.
    ///
    /// The sample clock advances by exactly the frames handed out, so
    /// the next window starts where this one ended even when the write
    /// itself wraps the ring.
    fn submit_audio(&mut self, platform: &mut Platform<'_>) {
        let cursors = match platform.audio.cursors() {
            Ok(cursors) => cursors,
            Err(err) => {
                if self.sound_valid {
                    warn!("audio cursor query failed, skipping sound this frame: {err}");
                }
                self.sound_valid = false;
                return;
            }
        };

        if !self.sound_valid {
            self.clock.reprime(cursors.write_cursor, BYTES_PER_SAMPLE);
            self.sound_valid = true;
            info!(
                "audio clock primed at write cursor {} (sample {})",
                cursors.write_cursor,
                self.clock.samples_written()
            );
        }

        let window = self
            .planner
            .plan(cursors.play_cursor, self.clock.samples_written());
        if window.is_empty() {
            return;
        }

        let synth = &mut self.synth;
        let clock = &mut self.clock;
        let written = platform.audio.write_region(
            window.byte_to_lock,
            window.bytes_to_write,
            &mut |region| {
                let frames = region.frames();
                synth.fill_interleaved(region.first);
                synth.fill_interleaved(region.second);
                clock.advance(frames as u64);
            },
        );
        if let Err(err) = written {
            warn!("audio region write failed, skipping sound this frame: {err}");
            self.sound_valid = false;
        }
    }

    /// Whether anything has asked the loop to quit
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the loop to quit after the current frame
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// The configuration the loop was built with
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// The most recently rendered frame
    pub fn video(&self) -> &VideoBuffer {
        &self.video
    }

    /// Current simulation state
    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    /// False while the sample clock waits to be primed from a healthy
    /// cursor report
    pub fn sound_valid(&self) -> bool {
        self.sound_valid
    }

    /// Stereo frames written to the ring since the clock was last primed
    pub fn samples_written(&self) -> u64 {
        self.clock.samples_written()
    }

    /// Frames completed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Timing of the most recent frame
    pub fn last_timing(&self) -> FrameTiming {
        self.last_timing
    }
}
