//! Event handling for the TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Actions that can be triggered by events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Quit the application
    Quit,
    /// Select the previous container
    SelectPrev,
    /// Select the next container
    SelectNext,
    /// Go to first container
    SelectFirst,
    /// Go to last container
    SelectLast,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Move focus to the next control of the selected container
    FocusNext,
    /// Move focus to the previous control
    FocusPrev,
    /// Activate the focused control
    Activate,
    /// Activate the toggle control
    Toggle,
    /// Activate the copy control
    Copy,
    /// Scroll an expanded payload up
    ScrollUp,
    /// Scroll an expanded payload down
    ScrollDown,
    /// Expand every container
    ExpandAll,
    /// Collapse every container
    CollapseAll,
    /// Toggle live mode
    ToggleLiveMode,
    /// Toggle help overlay
    ToggleHelp,
    /// Dismiss the alert
    DismissAlert,
    /// Redraw screen
    Redraw,
    /// No action
    None,
}

/// Handle a terminal event and return the corresponding action
pub fn handle_event(event: Event, alert_open: bool) -> AppAction {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(key, alert_open),
        Event::Resize(_, _) => AppAction::Redraw,
        _ => AppAction::None,
    }
}

/// Handle a key event
fn handle_key(key: KeyEvent, alert_open: bool) -> AppAction {
    // The alert blocks everything until dismissed
    if alert_open {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char(' ') => {
                AppAction::DismissAlert
            }
            _ => AppAction::None,
        };
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => AppAction::Quit,
            KeyCode::Char('l') => AppAction::Redraw,
            KeyCode::Char('u') => AppAction::PageUp,
            KeyCode::Char('d') => AppAction::PageDown,
            _ => AppAction::None,
        };
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => AppAction::Quit,

        // Navigation (vim-style)
        KeyCode::Char('j') | KeyCode::Down => AppAction::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => AppAction::SelectPrev,
        KeyCode::Char('g') | KeyCode::Home => AppAction::SelectFirst,
        KeyCode::Char('G') | KeyCode::End => AppAction::SelectLast,
        KeyCode::PageUp => AppAction::PageUp,
        KeyCode::PageDown => AppAction::PageDown,

        // Controls
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => AppAction::FocusNext,
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => AppAction::FocusPrev,
        KeyCode::Enter => AppAction::Activate,
        KeyCode::Char(' ') | KeyCode::Char('e') => AppAction::Toggle,
        KeyCode::Char('c') | KeyCode::Char('y') => AppAction::Copy,

        // Expanded payload scrolling
        KeyCode::Char('J') => AppAction::ScrollDown,
        KeyCode::Char('K') => AppAction::ScrollUp,

        // All containers
        KeyCode::Char('E') => AppAction::ExpandAll,
        KeyCode::Char('C') => AppAction::CollapseAll,

        // Other
        KeyCode::Char('L') => AppAction::ToggleLiveMode,
        KeyCode::Char('?') => AppAction::ToggleHelp,
        KeyCode::Char('r') => AppAction::Redraw,

        _ => AppAction::None,
    }
}

/// Key binding help text
pub const HELP_TEXT: &str = r#"
╭─────────────────────────────────────────╮
│                msgview                  │
│              Key Bindings               │
├─────────────────────────────────────────┤
│                                         │
│  Navigation                             │
│  ─────────                              │
│  j/k, ↑/↓    Select message             │
│  g/G         First/last message         │
│  PgUp/PgDn   Page up/down               │
│                                         │
│  Message                                │
│  ───────                                │
│  Tab, h/l    Move between controls      │
│  Enter       Activate focused control   │
│  Space, e    Expand/collapse            │
│  c, y        Copy expanded text         │
│  J/K         Scroll expanded message    │
│  E/C         Expand/collapse all        │
│                                         │
│  Other                                  │
│  ─────                                  │
│  L           Toggle live mode           │
│  r           Redraw screen              │
│  ?           Show this help             │
│  q, Esc      Quit                       │
│                                         │
╰─────────────────────────────────────────╯
"#;
