#[cfg(not(feature = "terminal"))]
fn main() {
    eprintln!(
        "The pixeltone demo requires the \"terminal\" feature. Rebuild with `--features terminal` to enable it."
    );
}

#[cfg(feature = "terminal")]
mod cli {
    use std::env;
    use std::time::Duration;

    use anyhow::Context as _;

    #[cfg(feature = "gamepad")]
    use pixeltone::platform::pad::GilrsGamepad;
    #[cfg(feature = "streaming")]
    use pixeltone::platform::stream::StreamAudio;
    use pixeltone::platform::headless::{
        HeadlessAudio, HeadlessDisplay, HeadlessEvents, HeadlessGamepad,
    };
    use pixeltone::platform::terminal::{TerminalDisplay, TerminalEvents};
    use pixeltone::platform::{AudioSink, GamepadProvider, Platform};
    use pixeltone::{viz, FrameCoordinator, LoopConfig};

    const DEFAULT_HEADLESS_FRAMES: u64 = 300;
    const TONE_METER_WIDTH: usize = 12;

    /// Audio backend the demo drives: the real device when available,
    /// otherwise a silent in-memory ring advanced by wall time
    enum AudioBackend {
        #[cfg(feature = "streaming")]
        Stream(StreamAudio),
        Silent(HeadlessAudio, f64),
    }

    impl AudioBackend {
        fn open(config: &LoopConfig) -> AudioBackend {
            #[cfg(feature = "streaming")]
            match StreamAudio::open(config) {
                Ok(stream) => return AudioBackend::Stream(stream),
                Err(err) => log::warn!("audio output unavailable, running silent: {err}"),
            }
            AudioBackend::Silent(HeadlessAudio::new(config), 0.0)
        }

        fn sink(&mut self) -> &mut dyn AudioSink {
            match self {
                #[cfg(feature = "streaming")]
                AudioBackend::Stream(stream) => stream,
                AudioBackend::Silent(audio, _) => audio,
            }
        }

        /// Move the silent ring's play cursor as wall time passes; the
        /// real device advances on its own
        fn advance(&mut self, elapsed: Duration, samples_per_second: u32) {
            if let AudioBackend::Silent(audio, carry) = self {
                let total = elapsed.as_secs_f64() * samples_per_second as f64 + *carry;
                let whole = total.floor();
                *carry = total - whole;
                audio.advance_play_samples(whole as usize);
            }
        }
    }

    fn open_gamepad() -> Box<dyn GamepadProvider> {
        #[cfg(feature = "gamepad")]
        match GilrsGamepad::new() {
            Ok(pads) => return Box::new(pads),
            Err(err) => log::warn!("gamepad support unavailable: {err}"),
        }
        Box::new(HeadlessGamepad::new())
    }

    fn parse_flag<T: std::str::FromStr>(
        name: &str,
        value: Option<String>,
        show_help: &mut bool,
    ) -> Option<T> {
        match value {
            Some(raw) => match raw.parse() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    eprintln!("Invalid {name} value: {raw}");
                    *show_help = true;
                    None
                }
            },
            None => {
                eprintln!("{name} requires a value");
                *show_help = true;
                None
            }
        }
    }

    /// Copy the ring contents out through the sink's own region lock
    fn snapshot_ring(audio: &mut dyn AudioSink) -> Vec<i16> {
        let size = audio.buffer_size();
        let mut samples = Vec::with_capacity(size / 2);
        let _ = audio.write_region(0, size, &mut |region| {
            samples.extend_from_slice(region.first);
            samples.extend_from_slice(region.second);
        });
        samples
    }

    #[cfg(feature = "export-wav")]
    fn dump_ring(path: &str, interleaved: &[i16], sample_rate: u32) -> anyhow::Result<()> {
        pixeltone::fileio::dump_wav(path, interleaved, sample_rate)
            .with_context(|| format!("dumping ring audio to {path}"))?;
        println!("Ring audio dumped to {path}");
        Ok(())
    }

    #[cfg(not(feature = "export-wav"))]
    fn dump_ring(path: &str, _interleaved: &[i16], _sample_rate: u32) -> anyhow::Result<()> {
        eprintln!(
            "Ignoring --dump-wav {path}: rebuild with `--features export-wav` to enable WAV dumps."
        );
        Ok(())
    }

    fn print_usage() {
        eprintln!(
            "Usage:\n  pixeltone [--headless] [--frames <n>] [--fps <n>] [--tone <hz>] [--volume <amp>] [--config <path>] [--dump-wav <path>]\n\nFlags:\n  --headless           Run without the terminal frontend for <n> frames\n  --frames <n>         Headless frame count (default {DEFAULT_HEADLESS_FRAMES})\n  --fps <n>            Frame-rate cap (default 60)\n  --tone <hz>          Starting tone frequency (default 256)\n  --volume <amp>       Tone amplitude on the i16 scale (default 3000)\n  --config <path>      Load loop configuration from a JSON file\n  --dump-wav <path>    Dump the final ring contents to a WAV file on exit\n  --list-keys          Print the key bindings and exit\n  -h, --help           Show this help\n\nExamples:\n  pixeltone\n  pixeltone --tone 440 --fps 30\n  pixeltone --headless --frames 120 --dump-wav ring.wav\n"
        );
    }

    fn print_key_bindings() {
        println!("Key bindings:");
        println!("  W / A / S / D    Move (the tone follows A and D)");
        println!("  Arrow keys       Actions (down arrow scrolls the gradient)");
        println!("  Q / E            Shoulders");
        println!("  Enter            Start");
        println!("  Space            Back");
        println!("  Escape, Ctrl-C   Quit");
    }

    fn print_summary(coordinator: &FrameCoordinator, config: &LoopConfig) {
        println!("\nLoop summary");
        println!("Frames run:      {}", coordinator.frame_count());
        println!("Samples written: {}", coordinator.samples_written());
        println!("Final tone:      {} Hz", coordinator.sim().tone_hz);
        println!("Ring latency:    {:.1} ms", config.latency_ms());
    }

    fn run_terminal(config: LoopConfig, dump: Option<&str>) -> anyhow::Result<()> {
        let mut audio = AudioBackend::open(&config);
        let mut pads = open_gamepad();
        let mut display = TerminalDisplay::new()?;
        let mut events = TerminalEvents::new()?;

        let mut coordinator = FrameCoordinator::new(
            config,
            &mut Platform {
                audio: audio.sink(),
                display: &mut display,
                events: &mut events,
                gamepad: pads.as_mut(),
            },
        )?;

        while coordinator.is_running() {
            let status = format!(
                "{} |{}| WASD move  arrows act  Esc quit",
                viz::stats_line(
                    coordinator.last_timing(),
                    coordinator.sim().tone_hz,
                    coordinator.sound_valid(),
                ),
                viz::tone_meter(coordinator.sim().tone_hz, TONE_METER_WIDTH),
            );
            display.set_status(status);

            let timing = coordinator.step(&mut Platform {
                audio: audio.sink(),
                display: &mut display,
                events: &mut events,
                gamepad: pads.as_mut(),
            })?;
            audio.advance(timing.total, config.samples_per_second);
        }

        let ring = if dump.is_some() {
            snapshot_ring(audio.sink())
        } else {
            Vec::new()
        };
        drop(events);
        drop(display);

        print_summary(&coordinator, &config);
        if let Some(path) = dump {
            dump_ring(path, &ring, config.samples_per_second)?;
        }
        Ok(())
    }

    fn run_headless(config: LoopConfig, frames: u64, dump: Option<&str>) -> anyhow::Result<()> {
        let mut audio = HeadlessAudio::new(&config);
        let mut display = HeadlessDisplay::new(config.video_width, config.video_height);
        let mut events = HeadlessEvents::new();
        let mut pads = HeadlessGamepad::new();

        let mut coordinator = FrameCoordinator::new(
            config,
            &mut Platform {
                audio: &mut audio,
                display: &mut display,
                events: &mut events,
                gamepad: &mut pads,
            },
        )?;

        let target = config.target_frame_duration(None);
        let frame_samples =
            (config.samples_per_second as f64 * target.as_secs_f64()).round() as usize;
        println!(
            "Running {} headless frames at {:.1} fps...",
            frames,
            1.0 / target.as_secs_f64()
        );

        for _ in 0..frames {
            coordinator.step(&mut Platform {
                audio: &mut audio,
                display: &mut display,
                events: &mut events,
                gamepad: &mut pads,
            })?;
            audio.advance_play_samples(frame_samples);
        }

        print_summary(&coordinator, &config);
        if let Some(path) = dump {
            dump_ring(path, audio.ring(), config.samples_per_second)?;
        }
        Ok(())
    }

    /// Everything the command line selects, parsed before any backend opens
    #[derive(Debug)]
    struct CliArgs {
        config: LoopConfig,
        headless: bool,
        frames: u64,
        dump_wav: Option<String>,
        show_help: bool,
        list_keys: bool,
    }

    fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
        let mut parsed = CliArgs {
            config: LoopConfig::default(),
            headless: false,
            frames: DEFAULT_HEADLESS_FRAMES,
            dump_wav: None,
            show_help: false,
            list_keys: false,
        };

        while let Some(arg) = args.next() {
            // The value flags take both `--flag value` and `--flag=value`.
            let (flag, inline) = match arg.split_once('=') {
                Some((name, value))
                    if matches!(
                        name,
                        "--config" | "--frames" | "--fps" | "--tone" | "--volume" | "--dump-wav"
                    ) =>
                {
                    (name.to_string(), Some(value.to_string()))
                }
                _ => (arg, None),
            };

            match flag.as_str() {
                "--headless" => parsed.headless = true,
                "--list-keys" => parsed.list_keys = true,
                "--help" | "-h" => parsed.show_help = true,
                "--config" => match inline.or_else(|| args.next()) {
                    Some(path) => {
                        parsed.config = LoopConfig::from_file(&path)
                            .with_context(|| format!("loading configuration from {path}"))?;
                    }
                    None => {
                        eprintln!("--config requires a path");
                        parsed.show_help = true;
                    }
                },
                "--frames" => {
                    let value = inline.or_else(|| args.next());
                    if let Some(n) = parse_flag("--frames", value, &mut parsed.show_help) {
                        parsed.frames = n;
                    }
                }
                "--fps" => {
                    let value = inline.or_else(|| args.next());
                    if let Some(n) = parse_flag("--fps", value, &mut parsed.show_help) {
                        parsed.config.default_fps = n;
                    }
                }
                "--tone" => {
                    let value = inline.or_else(|| args.next());
                    if let Some(hz) = parse_flag("--tone", value, &mut parsed.show_help) {
                        parsed.config.tone_hz = hz;
                    }
                }
                "--volume" => {
                    let value = inline.or_else(|| args.next());
                    if let Some(amp) = parse_flag("--volume", value, &mut parsed.show_help) {
                        parsed.config.tone_volume = amp;
                    }
                }
                "--dump-wav" => match inline.or_else(|| args.next()) {
                    Some(path) => parsed.dump_wav = Some(path),
                    None => {
                        eprintln!("--dump-wav requires a path");
                        parsed.show_help = true;
                    }
                },
                _ if flag.starts_with('-') => {
                    eprintln!("Unknown flag: {flag}");
                    parsed.show_help = true;
                }
                _ => {
                    eprintln!("Unexpected argument: {flag}");
                    parsed.show_help = true;
                }
            }
        }

        Ok(parsed)
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::init();

        println!("Pixeltone - Ring-Scheduled Tone Loop");
        println!("====================================\n");

        let args = parse_args(env::args().skip(1))?;
        if args.show_help {
            print_usage();
            return Ok(());
        }
        if args.list_keys {
            print_key_bindings();
            return Ok(());
        }

        if args.headless {
            run_headless(args.config, args.frames, args.dump_wav.as_deref())
        } else {
            run_terminal(args.config, args.dump_wav.as_deref())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::io::Write;

        fn parse(tokens: &[&str]) -> CliArgs {
            parse_args(tokens.iter().map(|t| t.to_string())).unwrap()
        }

        #[test]
        fn test_value_flags_take_space_and_equals_forms() {
            let spaced = parse(&[
                "--headless", "--frames", "2", "--fps", "30", "--tone", "440", "--volume",
                "1000", "--dump-wav", "ring.wav",
            ]);
            let inline = parse(&[
                "--headless",
                "--frames=2",
                "--fps=30",
                "--tone=440",
                "--volume=1000",
                "--dump-wav=ring.wav",
            ]);
            for args in [&spaced, &inline] {
                assert!(!args.show_help);
                assert!(args.headless);
                assert_eq!(args.frames, 2);
                assert_eq!(args.config.default_fps, 30);
                assert_eq!(args.config.tone_hz, 440);
                assert_eq!(args.config.tone_volume, 1_000.0);
                assert_eq!(args.dump_wav.as_deref(), Some("ring.wav"));
            }
        }

        #[test]
        fn test_config_flag_takes_both_forms() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("loop.json");
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(br#"{ "tone_hz": 444 }"#).unwrap();
            let path = path.to_str().unwrap();

            let spaced = parse(&["--config", path]);
            let inline_arg = format!("--config={path}");
            let inline = parse(&[inline_arg.as_str()]);
            assert_eq!(spaced.config.tone_hz, 444);
            assert_eq!(inline.config.tone_hz, 444);
        }

        #[test]
        fn test_missing_config_file_names_the_path() {
            let err = parse_args(
                ["--config", "/no/such/pixeltone.json"]
                    .iter()
                    .map(|t| t.to_string()),
            )
            .unwrap_err();
            assert!(format!("{err:#}").contains("/no/such/pixeltone.json"));
        }

        #[test]
        fn test_unknown_flag_requests_usage() {
            let args = parse(&["--bogus"]);
            assert!(args.show_help);
        }

        #[test]
        fn test_equals_form_on_a_boolean_flag_is_rejected() {
            let args = parse(&["--headless=yes"]);
            assert!(args.show_help);
            assert!(!args.headless);
        }

        #[test]
        fn test_missing_value_requests_usage() {
            let args = parse(&["--frames"]);
            assert!(args.show_help);
            assert_eq!(args.frames, DEFAULT_HEADLESS_FRAMES);
        }
    }
}

#[cfg(feature = "terminal")]
fn main() -> anyhow::Result<()> {
    cli::run()
}
