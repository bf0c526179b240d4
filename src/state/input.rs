//! Input Module - crossterm events to grid host signals
//!
//! Bridges crossterm's event system with the engine's host signal handlers.
//! Terminal rows are mapped to content units with a `line_height`, so a
//! grid laid out in pixels-like units scrolls by whole lines.
//!
//! # API
//!
//! - `translate_event` - Convert a crossterm Event to a `HostSignal`
//! - `apply_signal` - Feed a signal into an `InfiniteGrid`
//! - `poll_signal` - Non-blocking event check with timeout
//! - `terminal_capabilities` - Capability probe for terminal hosts
//! - `enable_mouse` / `disable_mouse` - Control mouse capture
//!
//! # Example
//!
//! ```ignore
//! use daybreak_grid::state::input::{apply_signal, poll_signal};
//! use std::time::Duration;
//!
//! loop {
//!     if let Ok(Some(signal)) = poll_signal(Duration::from_millis(16), 20.0) {
//!         if !apply_signal(&grid, signal) {
//!             break;
//!         }
//!     }
//!     scheduler.tick();
//! }
//! ```

use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent,
    KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
    MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use crossterm::execute;
use std::io::stdout;
use std::time::Duration;

use crate::engine::InfiniteGrid;
use crate::types::InputCapabilities;

/// Lines scrolled per wheel notch.
pub const WHEEL_LINES: f64 = 3.0;

/// Lines scrolled by PageUp / PageDown.
pub const PAGE_LINES: f64 = 20.0;

// =============================================================================
// HOST SIGNAL ENUM
// =============================================================================

/// Host-level event in content units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostSignal {
    /// Terminal resized. Width assumes cells half as wide as they are tall.
    Resize { width: f64, height: f64 },
    /// Wheel or keyboard scroll by a delta
    Wheel { delta_y: f64 },
    /// Absolute native scroll offset
    NativeScroll { offset: f64 },
    /// Switch between touch and wheel scrolling
    ToggleTouch,
    /// Re-run every cell update hook
    Refresh,
    /// Leave the event loop
    Quit,
}

// =============================================================================
// EVENT TRANSLATION
// =============================================================================

/// Convert a crossterm event. `None` for events the grid does not use.
pub fn translate_event(event: &CrosstermEvent, line_height: f64) -> Option<HostSignal> {
    match event {
        CrosstermEvent::Mouse(mouse) => translate_mouse(mouse, line_height),
        CrosstermEvent::Key(key) => translate_key(key, line_height),
        CrosstermEvent::Resize(columns, rows) => Some(HostSignal::Resize {
            width: f64::from(*columns) * line_height / 2.0,
            height: f64::from(*rows) * line_height,
        }),
        _ => None,
    }
}

fn translate_mouse(event: &CrosstermMouseEvent, line_height: f64) -> Option<HostSignal> {
    let delta_y = match event.kind {
        MouseEventKind::ScrollDown => WHEEL_LINES * line_height,
        MouseEventKind::ScrollUp => -WHEEL_LINES * line_height,
        _ => return None,
    };
    Some(HostSignal::Wheel { delta_y })
}

fn translate_key(event: &CrosstermKeyEvent, line_height: f64) -> Option<HostSignal> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') => Some(HostSignal::Quit),
            _ => None,
        };
    }

    let lines = match event.code {
        KeyCode::Down | KeyCode::Char('j') => 1.0,
        KeyCode::Up | KeyCode::Char('k') => -1.0,
        KeyCode::PageDown | KeyCode::Char(' ') => PAGE_LINES,
        KeyCode::PageUp => -PAGE_LINES,
        KeyCode::Char('t') => return Some(HostSignal::ToggleTouch),
        KeyCode::Char('r') => return Some(HostSignal::Refresh),
        KeyCode::Char('q') | KeyCode::Esc => return Some(HostSignal::Quit),
        _ => return None,
    };
    Some(HostSignal::Wheel {
        delta_y: lines * line_height,
    })
}

// =============================================================================
// SIGNAL ROUTING
// =============================================================================

/// Apply a signal to the grid. Returns `false` when the host should quit.
///
/// In touch mode wheel deltas move the native scroll offset instead, the
/// terminal having no native scrolling of its own. Resize only updates the
/// viewport height; the host owns the surface width.
pub fn apply_signal(grid: &InfiniteGrid, signal: HostSignal) -> bool {
    match signal {
        HostSignal::Resize { height, .. } => grid.handle_resize(height),
        HostSignal::Wheel { delta_y } if grid.use_touch_input() => {
            grid.handle_native_scroll(grid.scroll_position() + delta_y)
        }
        HostSignal::Wheel { delta_y } => grid.handle_wheel(delta_y),
        HostSignal::NativeScroll { offset } => grid.handle_native_scroll(offset),
        HostSignal::ToggleTouch => grid.set_touch_input(!grid.use_touch_input()),
        HostSignal::Refresh => grid.refresh_cells(),
        HostSignal::Quit => return false,
    }
    true
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for a grid signal with timeout.
/// Returns None if no usable event arrived within timeout.
pub fn poll_signal(timeout: Duration, line_height: f64) -> std::io::Result<Option<HostSignal>> {
    if poll(timeout)? {
        Ok(translate_event(&read()?, line_height))
    } else {
        Ok(None)
    }
}

/// Capabilities of a terminal host with mouse capture enabled.
pub fn terminal_capabilities() -> InputCapabilities {
    InputCapabilities::WHEEL | InputCapabilities::FINE_POINTER
}

// =============================================================================
// MOUSE CAPTURE
// =============================================================================

/// Enable mouse capture.
pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture)
}

/// Disable mouse capture.
pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(CrosstermKeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn press(code: KeyCode) -> CrosstermEvent {
        key(code, KeyModifiers::empty(), KeyEventKind::Press)
    }

    fn mouse(kind: MouseEventKind) -> CrosstermEvent {
        CrosstermEvent::Mouse(CrosstermMouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::empty(),
        })
    }

    #[test]
    fn test_wheel_scroll_directions() {
        assert_eq!(
            translate_event(&mouse(MouseEventKind::ScrollDown), 10.0),
            Some(HostSignal::Wheel { delta_y: 30.0 })
        );
        assert_eq!(
            translate_event(&mouse(MouseEventKind::ScrollUp), 10.0),
            Some(HostSignal::Wheel { delta_y: -30.0 })
        );
        assert_eq!(translate_event(&mouse(MouseEventKind::Moved), 10.0), None);
    }

    #[test]
    fn test_arrow_and_page_keys() {
        let keys = [
            (KeyCode::Down, 20.0),
            (KeyCode::Char('j'), 20.0),
            (KeyCode::Up, -20.0),
            (KeyCode::Char('k'), -20.0),
            (KeyCode::PageDown, 400.0),
            (KeyCode::PageUp, -400.0),
        ];

        for (code, delta_y) in keys {
            assert_eq!(
                translate_event(&press(code), 20.0),
                Some(HostSignal::Wheel { delta_y })
            );
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(translate_event(&press(KeyCode::Char('q')), 20.0), Some(HostSignal::Quit));
        assert_eq!(translate_event(&press(KeyCode::Esc), 20.0), Some(HostSignal::Quit));
        assert_eq!(
            translate_event(
                &key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press),
                20.0
            ),
            Some(HostSignal::Quit)
        );
        assert_eq!(
            translate_event(
                &key(KeyCode::Char('j'), KeyModifiers::CONTROL, KeyEventKind::Press),
                20.0
            ),
            None
        );
    }

    #[test]
    fn test_release_ignored() {
        assert_eq!(
            translate_event(
                &key(KeyCode::Down, KeyModifiers::empty(), KeyEventKind::Release),
                20.0
            ),
            None
        );
        assert_eq!(
            translate_event(
                &key(KeyCode::Down, KeyModifiers::empty(), KeyEventKind::Repeat),
                20.0
            ),
            Some(HostSignal::Wheel { delta_y: 20.0 })
        );
    }

    #[test]
    fn test_resize_in_content_units() {
        assert_eq!(
            translate_event(&CrosstermEvent::Resize(120, 40), 20.0),
            Some(HostSignal::Resize {
                width: 1200.0,
                height: 800.0
            })
        );
    }

    #[test]
    fn test_mode_keys() {
        assert_eq!(translate_event(&press(KeyCode::Char('t')), 20.0), Some(HostSignal::ToggleTouch));
        assert_eq!(translate_event(&press(KeyCode::Char('r')), 20.0), Some(HostSignal::Refresh));
        assert_eq!(translate_event(&CrosstermEvent::FocusGained, 20.0), None);
    }

    #[test]
    fn test_terminal_capabilities_prefer_wheel() {
        let caps = terminal_capabilities();
        assert!(caps.contains(InputCapabilities::WHEEL));
        assert!(!caps.prefers_touch());
    }
}
