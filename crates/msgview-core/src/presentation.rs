//! Collapsed/expanded presentation of a payload
//!
//! `render` is a pure function of the state and the precomputed renderings,
//! so the toggle can be checked without a terminal.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::DerivedText;

/// Rows available to a collapsed payload
pub const COLLAPSED_ROWS: u16 = 1;

/// Default height cap for an expanded payload
pub const DEFAULT_EXPANDED_ROWS: u16 = 20;

/// Ellipsis used when a collapsed payload is cut
pub const ELLIPSIS: &str = "…";

/// Icon and label of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFace {
    pub icon: &'static str,
    pub label: &'static str,
}

impl ControlFace {
    pub const EXPAND: ControlFace = ControlFace { icon: "▸", label: "Expand" };
    pub const COLLAPSE: ControlFace = ControlFace { icon: "▾", label: "Collapse" };
    pub const COPY: ControlFace = ControlFace { icon: "⧉", label: "Copy" };
    pub const COPIED: ControlFace = ControlFace { icon: "✓", label: "Copied!" };

    /// Confirmation that only swaps the icon and keeps `resting`'s label
    pub fn icon_only_confirmation(resting: ControlFace) -> ControlFace {
        ControlFace {
            icon: ControlFace::COPIED.icon,
            label: resting.label,
        }
    }

    /// `icon label`, as drawn in a container header
    pub fn display(&self) -> String {
        format!("{} {}", self.icon, self.label)
    }
}

/// Presentation state of one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationState {
    #[default]
    Collapsed,
    Expanded,
}

impl PresentationState {
    /// The state reached by activating the toggle
    pub fn toggled(self) -> Self {
        match self {
            PresentationState::Collapsed => PresentationState::Expanded,
            PresentationState::Expanded => PresentationState::Collapsed,
        }
    }
}

/// How text that does not fit is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Cut at the edge and mark with an ellipsis
    Ellipsis,
    /// Cut at the edge with no marker
    Clip,
}

/// Everything needed to draw a payload in a given state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation<'a> {
    pub text: &'a str,
    pub max_rows: u16,
    pub wrap: bool,
    pub scrollable: bool,
    pub overflow: Overflow,
    pub toggle: ControlFace,
}

/// Presentation for `state`, drawn from the precomputed renderings
pub fn render(state: PresentationState, derived: &DerivedText, expanded_rows: u16) -> Presentation<'_> {
    match state {
        PresentationState::Collapsed => Presentation {
            text: &derived.compact,
            max_rows: COLLAPSED_ROWS,
            wrap: false,
            scrollable: false,
            overflow: Overflow::Ellipsis,
            toggle: ControlFace::EXPAND,
        },
        PresentationState::Expanded => Presentation {
            text: &derived.expanded,
            max_rows: expanded_rows.max(COLLAPSED_ROWS),
            wrap: true,
            scrollable: true,
            overflow: Overflow::Clip,
            toggle: ControlFace::COLLAPSE,
        },
    }
}

/// Flatten `text` onto one line and fit it into `width` columns.
///
/// Line breaks and tabs become spaces. Text wider than `width` is cut and
/// ends with an ellipsis.
pub fn collapsed_line(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();

    if flat.width() <= width {
        return flat;
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - ELLIPSIS.width();
    let mut used = 0;
    let mut out = String::new();
    for c in flat.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    out
}
