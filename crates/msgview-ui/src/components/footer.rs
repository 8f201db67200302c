//! Status bar: position, classification, and the keys that act on the focused control

use msgview_core::ControlAction;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::App;

/// Render the status bar
pub fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![Span::styled(app.status_info(), status_style(app))];

    if let Some(message) = &app.status_message {
        spans.push(Span::styled(" │ ", dim));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Yellow)));
    }

    spans.push(Span::styled(" │ ", dim));
    spans.push(Span::styled(key_hints(app), dim));

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

fn status_style(app: &App) -> Style {
    if app.alert.is_some() {
        Style::default().fg(Color::Red).bold()
    } else if app.live_mode {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    }
}

/// Keys that matter right now
fn key_hints(app: &App) -> String {
    if app.alert.is_some() {
        return "enter/esc: dismiss".to_string();
    }
    let Some(widget) = app.selected_widget() else {
        return "?: help  q: quit".to_string();
    };

    let enter = match app.focus {
        ControlAction::Toggle => widget.toggle.face.label.to_lowercase(),
        ControlAction::Copy => "copy".to_string(),
    };
    format!("enter: {}  tab: next control  ?: help  q: quit", enter)
}
