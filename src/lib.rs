//! Real-time loop core with ring-scheduled audio
//!
//! A minimal interactive loop: every frame it produces a procedurally
//! generated video buffer and exactly enough freshly synthesized audio to
//! keep a looping ring buffer topped up ahead of the hardware play cursor,
//! while polling keyboard and gamepad input. The heart of the crate is the
//! ring-window scheduling scheme: a free-running sample counter is mapped
//! against the hardware playback cursor to derive the byte range that is
//! safe to overwrite this frame.
//!
//! # Features
//! - Ring-window planning with a constant look-ahead latency margin
//! - Phase-continuous sine synthesis into locked ring regions
//! - Edge-detected input with per-button half-transition counts
//! - Frame pacing against the display refresh rate
//! - Pluggable backends: headless (tests, CI), terminal, rodio, gilrs
//!
//! # Crate feature flags
//! - `terminal` (default): Terminal display + event pump, enables the demo CLI (`crossterm`)
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//! - `gamepad` (opt-in): Controller polling (enables optional `gilrs` dep)
//! - `export-wav` (opt-in): WAV dump of captured audio (enables optional `hound` dep)
//!
//! # Quick start
//! ## Core scheduling only
//! ```
//! use pixeltone::{RingWindowPlanner, SampleClock, ToneSynthesizer};
//!
//! let mut clock = SampleClock::new();
//! let mut planner = RingWindowPlanner::new(4, 48_000 * 4, 48_000 / 15);
//! let mut synth = ToneSynthesizer::new(48_000, 256.0, 3_000.0);
//!
//! // One frame: plan the safe window, fill it, advance the clock.
//! let window = planner.plan(0, clock.samples_written());
//! let frames = window.bytes_to_write / 4;
//! let pairs = synth.produce(frames);
//! clock.advance(frames as u64);
//! assert_eq!(pairs.len(), frames);
//! ```
//!
//! ## Full loop over headless backends
//! ```
//! use pixeltone::platform::headless::{
//!     HeadlessAudio, HeadlessDisplay, HeadlessEvents, HeadlessGamepad,
//! };
//! use pixeltone::platform::Platform;
//! use pixeltone::{FrameCoordinator, LoopConfig};
//!
//! let config = LoopConfig::default();
//! let mut audio = HeadlessAudio::new(&config);
//! let mut display = HeadlessDisplay::new(320, 180);
//! let mut events = HeadlessEvents::new();
//! let mut pads = HeadlessGamepad::new();
//! let mut platform = Platform {
//!     audio: &mut audio,
//!     display: &mut display,
//!     events: &mut events,
//!     gamepad: &mut pads,
//! };
//!
//! let mut coordinator = FrameCoordinator::new(config, &mut platform).unwrap();
//! coordinator.step(&mut platform).unwrap();
//! assert!(coordinator.is_running());
//! ```

#![warn(missing_docs)]

// Core modules (leaves first)
pub mod clock; // Free-running sample counter
pub mod config; // Loop configuration
pub mod fileio; // Debug file helpers
pub mod frame; // Frame coordinator (the loop driver)
pub mod input; // Edge-detected controller state
pub mod pace; // Frame pacing and timing stats
pub mod platform; // Backend contracts and implementations
pub mod ring; // Ring-window planner
pub mod sim; // Scalar simulation state
pub mod synth; // Tone synthesizer
pub mod video; // Pixel buffer and gradient render
pub mod viz; // Status-line formatting

/// Error types for loop and backend operations
#[derive(thiserror::Error, Debug)]
pub enum PixeltoneError {
    /// Audio backend failure (device open, cursor query, region lock)
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Display backend failure (blit, terminal setup)
    #[error("Display error: {0}")]
    DisplayError(String),

    /// Input backend failure (event pump, gamepad enumeration)
    #[error("Input device error: {0}")]
    InputError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for PixeltoneError {
    /// Converts a String into `PixeltoneError::Other`.
    ///
    /// Convenience for generic string errors; prefer the specific variant
    /// constructors (`AudioDeviceError`, `DisplayError`, `ConfigError`, ...)
    /// when the failure site knows which subsystem broke, so that callers
    /// can tell startup-fatal categories from transient ones.
    fn from(msg: String) -> Self {
        PixeltoneError::Other(msg)
    }
}

impl From<&str> for PixeltoneError {
    /// Converts a string slice into `PixeltoneError::Other`.
    ///
    /// See [`From<String>`] for guidance on when to use explicit variant
    /// constructors instead.
    fn from(msg: &str) -> Self {
        PixeltoneError::Other(msg.to_string())
    }
}

/// Result type for loop operations
pub type Result<T> = std::result::Result<T, PixeltoneError>;

// Public API exports
pub use clock::SampleClock;
pub use config::LoopConfig;
pub use frame::FrameCoordinator;
pub use input::{Button, ButtonState, ControllerInput, FrameInput, PadButtons};
pub use pace::{FramePacer, FrameTiming};
pub use platform::{
    AudioRegion, AudioSink, Dimensions, Display, EventPump, GamepadProvider, GamepadSample, Key,
    Platform, PlatformEvent, RingCursors,
};
pub use ring::{PlannedWindow, RingWindowPlanner};
pub use sim::SimState;
pub use synth::ToneSynthesizer;
pub use video::VideoBuffer;
