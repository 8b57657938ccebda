//! StatusLog Widget
//!
//! A borderless, bottom-anchored list of the status lines seen during the
//! current sync. Long lines wrap; the oldest lines scroll off the top.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use textwrap::wrap;

/// Bottom-anchored status history
pub struct StatusLog<'a> {
    lines: &'a [String],
    style: Style,
    latest_style: Style,
}

impl<'a> StatusLog<'a> {
    /// Create a log over `lines`, oldest first
    pub fn new(lines: &'a [String]) -> Self {
        Self {
            lines,
            style: Style::default(),
            latest_style: Style::default(),
        }
    }

    /// Style for older lines
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Style for the newest line
    pub fn latest_style(mut self, style: Style) -> Self {
        self.latest_style = style;
        self
    }
}

/// Wrap every entry to `width`, tagging rows that belong to the newest entry
fn wrapped_rows(lines: &[String], width: usize) -> Vec<(String, bool)> {
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .flat_map(|(i, line)| {
            wrap(line, width.max(1))
                .into_iter()
                .map(move |row| (row.into_owned(), i == last))
        })
        .collect()
}

impl Widget for StatusLog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let rows = wrapped_rows(self.lines, area.width as usize);
        let visible = rows.len().min(area.height as usize);
        let top = area.bottom() - visible as u16;

        for (i, (row, is_latest)) in rows.iter().skip(rows.len() - visible).enumerate() {
            let style = if *is_latest {
                self.latest_style
            } else {
                self.style
            };
            buf.set_stringn(area.x, top + i as u16, row, area.width as usize, style);
        }
    }
}
