//! FormPanel Widget
//!
//! Label / value rows for the login form, two rows per field.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use crate::input::{FormInput, InputField};
use crate::theme::{DIM_GRAY, FOCUS_BLUE, SUCCESS_GREEN, TEXT_LIGHT, TEXT_VALUE};

/// Columns reserved for labels
const LABEL_WIDTH: u16 = 14;

/// Rows per field (value row plus spacing)
const ROW_STRIDE: u16 = 2;

/// Rows the panel needs
pub const FORM_HEIGHT: u16 = ROW_STRIDE * InputField::ORDER.len() as u16;

/// The login form
pub struct FormPanel<'a> {
    input: &'a FormInput,
    has_credential: bool,
}

impl<'a> FormPanel<'a> {
    /// Create a panel for `input`
    pub fn new(input: &'a FormInput, has_credential: bool) -> Self {
        Self {
            input,
            has_credential,
        }
    }

    /// Where the terminal cursor goes for the focused field
    pub fn cursor(area: Rect, input: &FormInput) -> Position {
        let row = InputField::ORDER
            .iter()
            .position(|f| *f == input.focus())
            .unwrap_or_default() as u16;
        let x = area.x + LABEL_WIDTH + 2 + input.display_width(input.focus()) as u16;
        Position::new(x.min(area.right().saturating_sub(1)), area.y + row * ROW_STRIDE)
    }
}

impl Widget for FormPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width <= LABEL_WIDTH + 4 {
            return;
        }
        let value_width = (area.width - LABEL_WIDTH - 2) as usize;

        for (i, field) in InputField::ORDER.iter().enumerate() {
            let y = area.y + i as u16 * ROW_STRIDE;
            if y >= area.bottom() {
                break;
            }

            let focused = *field == self.input.focus();
            let label_style = if focused {
                Style::default().fg(FOCUS_BLUE).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(TEXT_LIGHT)
            };
            let marker = if focused { '›' } else { ' ' };
            buf.set_stringn(
                area.x,
                y,
                format!("{marker} {}", field.label()),
                LABEL_WIDTH as usize,
                label_style,
            );

            let value = self.input.display_value(*field);
            let (text, style) = if *field == InputField::Token && value.is_empty() && self.has_credential {
                ("signed in (Ctrl-L to sign out)".to_string(), Style::default().fg(SUCCESS_GREEN))
            } else if value.is_empty() {
                (field.placeholder().to_string(), Style::default().fg(DIM_GRAY))
            } else {
                (value, Style::default().fg(TEXT_VALUE))
            };
            buf.set_stringn(area.x + LABEL_WIDTH + 2, y, text, value_width, style);
        }
    }
}
