//! Terminal Frontend
//!
//! Renders the video buffer into the terminal as truecolor half blocks
//! (each character cell carries two pixel rows, upper via foreground and
//! lower via background) and drains crossterm key events into platform
//! events. The bottom terminal row is reserved for a status line.
//!
//! Construct [`TerminalDisplay`] before [`TerminalEvents`]: the display
//! owns raw mode and the alternate screen, entering both on construction
//! and restoring them on drop and on panic.
//!
//! Terminals only report key releases under the kitty keyboard protocol.
//! When the protocol is unavailable the event pump synthesizes a release
//! once a held key has produced no press or repeat for
//! [`KEY_RELEASE_TIMEOUT`], which is long enough to outlast the initial
//! auto-repeat delay.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;

use crate::platform::{Dimensions, Display, EventPump, Key, PlatformEvent};
use crate::video::VideoBuffer;
use crate::Result;

/// Idle time after which a held key without release reporting is
/// considered released
pub const KEY_RELEASE_TIMEOUT: Duration = Duration::from_millis(600);

/// Restore terminal to normal state.
///
/// Safe to call multiple times; errors are ignored.
fn restore_terminal() {
    let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Pixel dimensions offered by a terminal of `cols` x `rows` cells, with
/// the bottom row held back for the status line
fn cell_dimensions(cols: u16, rows: u16) -> Dimensions {
    Dimensions {
        width: cols as u32,
        height: rows.saturating_sub(1) as u32 * 2,
    }
}

/// Map a crossterm key code onto a loop key
fn map_key_code(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::W),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::A),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::S),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::D),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Key::Q),
        KeyCode::Char('e') | KeyCode::Char('E') => Some(Key::E),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

/// Half-block truecolor display over the alternate screen
pub struct TerminalDisplay {
    cell_cols: u16,
    cell_rows: u16,
    escape: String,
    status: String,
}

impl TerminalDisplay {
    /// Enter raw mode and the alternate screen, hide the cursor and
    /// register a panic hook that restores the terminal
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            restore_terminal();
            original_hook(panic_info);
        }));

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            cell_cols: cols,
            cell_rows: rows,
            escape: String::new(),
            status: String::new(),
        })
    }

    /// Text shown on the reserved bottom row at the next blit
    pub fn set_status(&mut self, line: String) {
        self.status = line;
    }
}

impl Display for TerminalDisplay {
    fn client_dimensions(&self) -> Dimensions {
        cell_dimensions(self.cell_cols, self.cell_rows)
    }

    fn refresh_rate(&self) -> Option<u32> {
        None
    }

    fn blit(&mut self, frame: &VideoBuffer) -> Result<()> {
        if let Ok((cols, rows)) = terminal::size() {
            self.cell_cols = cols;
            self.cell_rows = rows;
        }
        let usable = cell_dimensions(self.cell_cols, self.cell_rows);
        let draw_width = frame.width().min(usable.width as usize);
        let draw_height = frame.height().min(usable.height as usize);

        self.escape.clear();
        let mut last_fg = None;
        let mut last_bg = None;
        for cell_row in 0..draw_height.div_ceil(2) {
            write!(self.escape, "\x1B[{};1H", cell_row + 1).ok();
            for x in 0..draw_width {
                let top = frame.pixel_at(x, cell_row * 2);
                let bottom_y = cell_row * 2 + 1;
                let bottom = if bottom_y < frame.height() {
                    frame.pixel_at(x, bottom_y)
                } else {
                    0
                };
                if last_fg != Some(top) {
                    write!(
                        self.escape,
                        "\x1B[38;2;{};{};{}m",
                        (top >> 16) & 0xFF,
                        (top >> 8) & 0xFF,
                        top & 0xFF
                    )
                    .ok();
                    last_fg = Some(top);
                }
                if last_bg != Some(bottom) {
                    write!(
                        self.escape,
                        "\x1B[48;2;{};{};{}m",
                        (bottom >> 16) & 0xFF,
                        (bottom >> 8) & 0xFF,
                        bottom & 0xFF
                    )
                    .ok();
                    last_bg = Some(bottom);
                }
                self.escape.push('▀');
            }
            write!(self.escape, "\x1B[0m").ok();
            last_fg = None;
            last_bg = None;
        }
        write!(
            self.escape,
            "\x1B[{};1H\x1B[2K\r{}",
            self.cell_rows, self.status
        )
        .ok();

        let mut out = io::stdout().lock();
        out.write_all(self.escape.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Crossterm event pump with hold-timeout release synthesis
pub struct TerminalEvents {
    enhanced: bool,
    held: HashMap<Key, Instant>,
    pending: VecDeque<PlatformEvent>,
}

impl TerminalEvents {
    /// Probe for the kitty keyboard protocol and enable release reporting
    /// when the terminal supports it
    pub fn new() -> Result<Self> {
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                io::stdout(),
                event::PushKeyboardEnhancementFlags(
                    event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
        }
        Ok(Self {
            enhanced,
            held: HashMap::new(),
            pending: VecDeque::new(),
        })
    }

    /// Whether the terminal reports real key releases
    pub fn reports_releases(&self) -> bool {
        self.enhanced
    }

    fn translate(&mut self, event: Event) -> Option<PlatformEvent> {
        match event {
            Event::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    return Some(PlatformEvent::CloseRequested);
                }
                let mapped = map_key_code(key.code)?;
                match key.kind {
                    KeyEventKind::Press => {
                        let repeat = if self.enhanced {
                            false
                        } else {
                            self.held.insert(mapped, Instant::now()).is_some()
                        };
                        Some(PlatformEvent::Key {
                            key: mapped,
                            pressed: true,
                            repeat,
                        })
                    }
                    KeyEventKind::Repeat => {
                        if !self.enhanced {
                            self.held.insert(mapped, Instant::now());
                        }
                        Some(PlatformEvent::Key {
                            key: mapped,
                            pressed: true,
                            repeat: true,
                        })
                    }
                    KeyEventKind::Release => {
                        self.held.remove(&mapped);
                        Some(PlatformEvent::Key {
                            key: mapped,
                            pressed: false,
                            repeat: false,
                        })
                    }
                }
            }
            Event::Resize(cols, rows) => {
                Some(PlatformEvent::Resized(cell_dimensions(cols, rows)))
            }
            _ => None,
        }
    }

    fn synthesize_releases(&mut self) -> Option<PlatformEvent> {
        if self.enhanced {
            return None;
        }
        let now = Instant::now();
        let expired: Vec<Key> = self
            .held
            .iter()
            .filter(|(_, &pressed_at)| now.duration_since(pressed_at) >= KEY_RELEASE_TIMEOUT)
            .map(|(&key, _)| key)
            .collect();
        for key in expired {
            self.held.remove(&key);
            self.pending.push_back(PlatformEvent::Key {
                key,
                pressed: false,
                repeat: false,
            });
        }
        self.pending.pop_front()
    }
}

impl EventPump for TerminalEvents {
    fn poll_event(&mut self) -> Option<PlatformEvent> {
        if let Some(pending) = self.pending.pop_front() {
            return Some(pending);
        }
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    warn!("terminal event poll failed: {err}");
                    return Some(PlatformEvent::CloseRequested);
                }
            }
            let event = match event::read() {
                Ok(event) => event,
                Err(err) => {
                    warn!("terminal event read failed: {err}");
                    return Some(PlatformEvent::CloseRequested);
                }
            };
            if let Some(translated) = self.translate(event) {
                return Some(translated);
            }
        }
        self.synthesize_releases()
    }
}

impl Drop for TerminalEvents {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), event::PopKeyboardEnhancementFlags);
        }
    }
}
