//! Header component

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::App;

/// Render the header
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let total = app.page.len();
    let expanded = app
        .page
        .containers()
        .iter()
        .filter(|c| {
            c.widget
                .as_ref()
                .is_some_and(|w| w.state == msgview_core::PresentationState::Expanded)
        })
        .count();

    let live_indicator = if app.live_mode { " LIVE" } else { "" };

    let header_text = format!(
        "{} │ {} messages, {} expanded │ v{}{}",
        app.title(),
        total,
        expanded,
        env!("CARGO_PKG_VERSION"),
        live_indicator
    );

    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::BOTTOM));

    frame.render_widget(header, area);
}
