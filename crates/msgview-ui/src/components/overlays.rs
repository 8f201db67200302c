//! Overlay components (help, alert)

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::event::HELP_TEXT;

/// Render the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(50, 80, frame.area());

    // Clear background
    frame.render_widget(Clear, area);

    let help = Paragraph::new(HELP_TEXT)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    frame.render_widget(help, area);
}

/// Render a blocking alert. Enter or Esc dismisses it.
pub fn render_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(60, 30, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(
            "[ OK ]",
            Style::default().add_modifier(Modifier::REVERSED),
        ))
        .centered(),
    ];

    let alert = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );

    frame.render_widget(alert, area);
}

/// Helper to create a centered rect with percentage width and height
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let width = r.width * percent_x / 100;
    let height = r.height * percent_y / 100;
    let x = (r.width - width) / 2;
    let y = (r.height - height) / 2;

    Rect::new(r.x + x, r.y + y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::rows;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(r, Rect::new(25, 10, 50, 20));
    }

    #[test]
    fn test_alert_shows_message() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| render_alert(frame, "Copy failed: no clipboard helper found"))
            .unwrap();
        let rows = rows(terminal.backend().buffer());
        assert!(rows.iter().any(|r| r.contains("Copy failed")));
        assert!(rows.iter().any(|r| r.contains("[ OK ]")));
    }
}
