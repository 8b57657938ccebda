//! Theme and Colors
//!
//! Slate background tones with a calendar-blue accent.

use ratatui::style::{Color, Modifier, Style};

use shift_sync_core::NotifyLevel;

// ============================================================================
// Palette
// ============================================================================

/// Primary accent - the sync button
pub const ACCENT_BLUE: Color = Color::Rgb(30, 64, 175);

/// Focus ring
pub const FOCUS_BLUE: Color = Color::Rgb(96, 165, 250);

/// Labels and headings
pub const TEXT_LIGHT: Color = Color::Rgb(241, 245, 249);

/// Field values
pub const TEXT_VALUE: Color = Color::Rgb(148, 163, 184);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 116, 139);

/// Disabled button background
pub const DISABLED_SLATE: Color = Color::Rgb(51, 65, 85);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(248, 113, 113);

/// Warning amber
pub const WARNING_AMBER: Color = Color::Rgb(251, 191, 36);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

// ============================================================================
// Styles
// ============================================================================

/// Style for a notification of the given level
pub fn notify_style(level: NotifyLevel) -> Style {
    match level {
        NotifyLevel::Info => Style::default().fg(TEXT_LIGHT),
        NotifyLevel::Warning => Style::default().fg(WARNING_AMBER),
        NotifyLevel::Error => Style::default().fg(ERROR_RED),
    }
}

/// Style for the sync button
pub fn button_style(disabled: bool) -> Style {
    if disabled {
        Style::default().fg(DIM_GRAY).bg(DISABLED_SLATE)
    } else {
        Style::default()
            .fg(TEXT_LIGHT)
            .bg(ACCENT_BLUE)
            .add_modifier(Modifier::BOLD)
    }
}
