use ratatui::style::Color;

use super::helpers::hex_to_color;
use crate::types::{BlockCategory, BlockStatus};

/// Unified color theme for the application
pub struct Theme;

impl Theme {
    /// Primary branding color
    pub fn primary() -> Color {
        Color::Magenta
    }

    /// Secondary/border color
    pub fn secondary() -> Color {
        Color::Cyan
    }

    /// Completed blocks
    pub fn success() -> Color {
        Color::Green
    }

    /// Distracted blocks and notices
    pub fn warn() -> Color {
        Color::Yellow
    }

    /// Selection/highlight
    pub fn highlight() -> Color {
        Color::Cyan
    }

    /// Selection marker/arrow
    pub fn selection_marker() -> Color {
        Color::Green
    }

    /// Dimmed/inactive text
    pub fn dim() -> Color {
        Color::DarkGray
    }

    /// Normal text
    pub fn text() -> Color {
        Color::White
    }

    /// Accent for titles and weights
    pub fn accent() -> Color {
        Color::LightBlue
    }

    pub fn category(category: BlockCategory) -> Color {
        hex_to_color(category.color()).unwrap_or(Self::accent())
    }

    pub fn status(status: BlockStatus) -> Color {
        match status {
            BlockStatus::Planned => Self::text(),
            BlockStatus::Completed => Self::success(),
            BlockStatus::Distracted => Self::warn(),
        }
    }
}
