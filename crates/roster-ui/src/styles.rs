//! Ayu color theme and styling functions for roster CLI output.
//!
//! Only states that need attention get color: flag labels are colored by
//! their category, amounts stay plain, failures are red.

use owo_colors::OwoColorize;
use roster_flags::{Category, FlagLabel};

use crate::terminal::{supports_color, terminal_width};

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const PRIMARY: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

pub const ICON_PASS: &str = "\u{2713}";
pub const ICON_FAIL: &str = "\u{2716}";

/// Separator lines never get wider than this.
const SEPARATOR_MAX: usize = 60;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn paint(s: &str, rgb: (u8, u8, u8), bold: bool, enabled: bool) -> String {
    match (enabled, bold) {
        (false, _) => s.to_string(),
        (true, false) => s.truecolor(rgb.0, rgb.1, rgb.2).to_string(),
        (true, true) => s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string(),
    }
}

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    paint(s, rgb, false, supports_color())
}

// ---------------------------------------------------------------------------
// Core semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

/// Renders a section header in uppercase with accent color and bold.
pub fn render_header(s: &str) -> String {
    paint(&s.to_uppercase(), ACCENT, true, supports_color())
}

/// A muted horizontal rule sized to the terminal.
pub fn render_separator() -> String {
    render_muted(&"\u{2500}".repeat(terminal_width().min(SEPARATOR_MAX)))
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_fail_icon() -> String {
    color_str(ICON_FAIL, FAIL)
}

// ---------------------------------------------------------------------------
// Flag labels
// ---------------------------------------------------------------------------

fn category_color(category: &Category) -> Option<(u8, u8, u8)> {
    match category {
        Category::Success => Some(PASS),
        Category::Info => Some(ACCENT),
        Category::Warning => Some(WARN),
        Category::Danger => Some(FAIL),
        Category::Primary => Some(PRIMARY),
        Category::Default | Category::Custom(_) => None,
    }
}

/// Renders a label colored by its category. Default and custom categories
/// use standard text.
pub fn render_category(label: &str, category: &Category) -> String {
    match category_color(category) {
        Some(rgb) => color_str(label, rgb),
        None => label.to_string(),
    }
}

/// Renders formatted flag labels as a comma-separated list. Absence labels
/// are muted.
pub fn render_flag_labels(labels: &[FlagLabel]) -> String {
    labels
        .iter()
        .map(|l| {
            if l.absent {
                render_muted(&l.label)
            } else {
                render_category(&l.label, &l.category)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Formula errors
// ---------------------------------------------------------------------------

/// Renders an expression with a caret under byte offset `position`.
pub fn render_error_pointer(expression: &str, position: usize) -> String {
    let offset = expression
        .char_indices()
        .take_while(|(i, _)| *i < position)
        .count();
    format!("  {}\n  {}{}", expression, " ".repeat(offset), render_fail("^"))
}
