//! Message list: one bordered container per record

use msgview_core::{
    collapsed_line, Container, ControlAction, ControlFace, PresentationState, Widget,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

use crate::{views, App};

/// Render the message list
pub fn render_message_list(frame: &mut Frame, area: Rect, app: &App) {
    let containers = app.page.containers();
    if containers.is_empty() {
        let empty = Paragraph::new("No messages")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let expanded_rows = app.page.expanded_rows();
    let heights: Vec<u16> = containers
        .iter()
        .map(|c| container_height(c, area.width, expanded_rows))
        .collect();

    let selected = app.selected_index().unwrap_or(0);
    let first = first_visible(&heights, selected, area.height);

    let mut y = area.y;
    let bottom = area.y + area.height;
    for (i, container) in containers.iter().enumerate().skip(first) {
        if y >= bottom {
            break;
        }
        let height = heights[i].min(bottom - y);
        let rect = Rect::new(area.x, y, area.width, height);
        let focus = (i == selected).then_some(app.focus);
        render_container(frame, rect, container, focus, expanded_rows);
        y += height;
    }
}

/// Rows a container takes, borders included
pub fn container_height(container: &Container, width: u16, expanded_rows: u16) -> u16 {
    let body = match &container.widget {
        Some(widget) => body_rows(widget, width.saturating_sub(2), expanded_rows),
        None => 1,
    };
    body + 2
}

/// Rows of payload shown for a widget at `width` columns
fn body_rows(widget: &Widget, width: u16, expanded_rows: u16) -> u16 {
    let presentation = widget.presentation(expanded_rows);
    if !presentation.wrap {
        return presentation.max_rows;
    }
    let total = wrapped_line_count(widget, width);
    total.clamp(1, presentation.max_rows)
}

/// Largest scroll offset that still fills an expanded widget's body
pub fn max_scroll(widget: &Widget, width: u16, expanded_rows: u16) -> u16 {
    let inner = width.saturating_sub(2);
    wrapped_line_count(widget, inner).saturating_sub(body_rows(widget, inner, expanded_rows))
}

fn wrapped_line_count(widget: &Widget, width: u16) -> u16 {
    let lines = views::render_payload(&widget.derived.expanded, widget.classification);
    let count = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    u16::try_from(count).unwrap_or(u16::MAX)
}

/// First container to draw so that `selected` is fully on screen
fn first_visible(heights: &[u16], selected: usize, available: u16) -> usize {
    let mut used: u32 = 0;
    let mut first = selected;
    for i in (0..=selected.min(heights.len().saturating_sub(1))).rev() {
        used += u32::from(heights[i]);
        if used > u32::from(available) {
            break;
        }
        first = i;
    }
    first
}

/// Draw one container. `focus` is set when the container is selected.
fn render_container(
    frame: &mut Frame,
    area: Rect,
    container: &Container,
    focus: Option<ControlAction>,
    expanded_rows: u16,
) {
    let is_selected = focus.is_some();
    let border_style = if container.widget.is_none() {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else if is_selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title_line(container, is_selected));

    let Some(widget) = &container.widget else {
        let body = Paragraph::new("(no payload)")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(body, area);
        return;
    };

    let block = block.title_top(controls_line(widget, focus).right_aligned());
    let inner = block.inner(area);
    let presentation = widget.presentation(expanded_rows);

    match widget.state {
        PresentationState::Collapsed => {
            let line = collapsed_line(presentation.text, inner.width as usize);
            let body = Paragraph::new(line).block(block);
            frame.render_widget(body, area);
        }
        PresentationState::Expanded => {
            let lines = views::render_payload(presentation.text, widget.classification);
            let total = wrapped_line_count(widget, inner.width);
            let max_scroll = total.saturating_sub(inner.height);
            let scroll = widget.scroll.min(max_scroll);

            let body = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            frame.render_widget(body, area);

            if total > inner.height {
                let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓"));

                let mut scrollbar_state = ScrollbarState::new(total as usize)
                    .position(scroll as usize)
                    .viewport_content_length(inner.height as usize);

                frame.render_stateful_widget(
                    scrollbar,
                    area.inner(Margin {
                        vertical: 1,
                        horizontal: 0,
                    }),
                    &mut scrollbar_state,
                );
            }
        }
    }
}

/// ` orders p0@12 · time · key=K · headers (JSON) `
fn title_line(container: &Container, is_selected: bool) -> Line<'static> {
    let record = &container.record;
    let mut parts = vec![record.location()];

    let time = record.format_time();
    if !time.is_empty() {
        parts.push(time);
    }
    if let Some(key) = &record.key {
        parts.push(format!("key={}", key));
    }
    let headers = record.headers_display();
    if !headers.is_empty() {
        parts.push(headers);
    }

    let label_style = if is_selected {
        Style::default().fg(Color::White).bold()
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut spans = vec![Span::styled(format!(" {} ", parts.join(" · ")), label_style)];
    if let Some(widget) = &container.widget {
        let color = match widget.classification {
            msgview_core::Classification::Json => Color::Green,
            msgview_core::Classification::Text => Color::Blue,
            msgview_core::Classification::TextInvalidJson => Color::Yellow,
        };
        spans.push(Span::styled(
            format!("{} ", widget.classification.label()),
            Style::default().fg(color),
        ));
    }
    Line::from(spans)
}

/// `[▸ Expand] [⧉ Copy]`, with the focused control reversed
fn controls_line(widget: &Widget, focus: Option<ControlAction>) -> Line<'static> {
    let control = |face: ControlFace, action: ControlAction| {
        let style = if focus == Some(action) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Span::styled(format!("[{}]", face.display()), style)
    };

    Line::from(vec![
        Span::raw(" "),
        control(widget.toggle.face, ControlAction::Toggle),
        Span::raw(" "),
        control(widget.copy.face, ControlAction::Copy),
        Span::raw(" "),
    ])
}
