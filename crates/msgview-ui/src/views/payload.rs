//! Styled lines for a payload body

use msgview_core::Classification;
use ratatui::prelude::*;

/// Render `text` as styled lines, highlighting it when it is JSON
pub fn render_payload(text: &str, classification: Classification) -> Vec<Line<'static>> {
    match classification {
        Classification::Json => text.lines().map(highlight_json_line).collect(),
        Classification::Text | Classification::TextInvalidJson => {
            text.lines().map(|l| Line::from(l.to_string())).collect()
        }
    }
}

/// Apply JSON syntax highlighting to a single line
fn highlight_json_line(text: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if !current.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current)));
                }

                // Collect string, honoring escapes
                let mut s = String::from('"');
                let mut escaped = false;
                for c in chars.by_ref() {
                    s.push(c);
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    }
                }

                // A key is followed by a colon
                let is_key = chars.clone().find(|c| !c.is_whitespace()) == Some(':');
                let style = if is_key {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Green)
                };
                spans.push(Span::styled(s, style));
            }
            '0'..='9' | '-' => {
                if !current.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current)));
                }

                let mut num = String::from(ch);
                while let Some(c) = chars.next_if(|c| {
                    c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')
                }) {
                    num.push(c);
                }
                spans.push(Span::styled(num, Style::default().fg(Color::Yellow)));
            }
            't' | 'f' | 'n' => {
                if !current.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current)));
                }

                let mut keyword = String::from(ch);
                while let Some(c) = chars.next_if(|c| c.is_alphabetic()) {
                    keyword.push(c);
                }

                if matches!(keyword.as_str(), "true" | "false" | "null") {
                    spans.push(Span::styled(keyword, Style::default().fg(Color::Magenta)));
                } else {
                    current.push_str(&keyword);
                }
            }
            '{' | '}' | '[' | ']' | ':' | ',' => {
                if !current.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current)));
                }
                spans.push(Span::styled(ch.to_string(), Style::default().fg(Color::White)));
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        spans.push(Span::raw(current));
    }

    Line::from(spans)
}
