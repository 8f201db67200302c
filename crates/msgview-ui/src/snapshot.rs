//! Plain-terminal rendering of a drawn frame, for `--screenshot`

use ratatui::buffer::Buffer;
use ratatui::style::{Color, Modifier, Style};

const MODIFIER_CODES: [(Modifier, u8); 5] = [
    (Modifier::BOLD, 1),
    (Modifier::DIM, 2),
    (Modifier::ITALIC, 3),
    (Modifier::UNDERLINED, 4),
    (Modifier::REVERSED, 7),
];

/// Buffer contents as text with SGR escapes.
///
/// A style sequence is written only where the style changes, and every row ends
/// with a reset so rows can be printed independently.
pub fn buffer_to_ansi(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut out = String::new();

    for y in area.top()..area.bottom() {
        let mut current: Option<Style> = None;
        for x in area.left()..area.right() {
            let Some(cell) = buffer.cell((x, y)) else {
                continue;
            };
            let style = cell.style();
            if current != Some(style) {
                out.push_str(&sgr(style));
                current = Some(style);
            }
            out.push_str(cell.symbol());
        }
        out.push_str("\x1b[0m\n");
    }
    out
}

/// One escape that resets and then applies `style`
fn sgr(style: Style) -> String {
    let mut params = vec!["0".to_string()];
    if let Some(fg) = style.fg.and_then(|c| color_param(c, false)) {
        params.push(fg);
    }
    if let Some(bg) = style.bg.and_then(|c| color_param(c, true)) {
        params.push(bg);
    }
    for (modifier, code) in MODIFIER_CODES {
        if style.add_modifier.contains(modifier) {
            params.push(code.to_string());
        }
    }
    format!("\x1b[{}m", params.join(";"))
}

fn color_param(color: Color, background: bool) -> Option<String> {
    let layer = if background { 10 } else { 0 };
    let param = match color {
        Color::Reset => return None,
        Color::Rgb(r, g, b) => format!("{};2;{};{};{}", 38 + layer, r, g, b),
        Color::Indexed(i) => format!("{};5;{}", 38 + layer, i),
        named => {
            let index = palette_index(named)?;
            let base = if index < 8 { 30 } else { 90 - 8 };
            (base + layer + index).to_string()
        }
    };
    Some(param)
}

/// Position in the 16-color terminal palette
fn palette_index(color: Color) -> Option<u8> {
    let index = match color {
        Color::Black => 0,
        Color::Red => 1,
        Color::Green => 2,
        Color::Yellow => 3,
        Color::Blue => 4,
        Color::Magenta => 5,
        Color::Cyan => 6,
        Color::Gray => 7,
        Color::DarkGray => 8,
        Color::LightRed => 9,
        Color::LightGreen => 10,
        Color::LightYellow => 11,
        Color::LightBlue => 12,
        Color::LightMagenta => 13,
        Color::LightCyan => 14,
        Color::White => 15,
        _ => return None,
    };
    Some(index)
}
