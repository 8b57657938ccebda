//! SyncButton Widget
//!
//! Draws a presenter `StatusView` as a one-line button.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use shift_sync_core::StatusView;

use crate::theme::button_style;

/// Spinner frames, advanced once per tick
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// The sync button
pub struct SyncButton<'a> {
    view: &'a StatusView,
    tick: usize,
}

impl<'a> SyncButton<'a> {
    /// Create a button for `view` at animation frame `tick`
    pub fn new(view: &'a StatusView, tick: usize) -> Self {
        Self { view, tick }
    }

    /// Button caption
    pub fn caption(&self) -> String {
        if self.view.spinner_visible {
            let frame = SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()];
            format!("{frame} {}", self.view.text)
        } else {
            self.view.text.clone()
        }
    }
}

impl Widget for SyncButton<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let style = button_style(self.view.disabled);
        buf.set_style(area, style);

        let caption = self.caption();
        let width = caption.width().min(area.width as usize) as u16;
        let x = area.x + (area.width - width) / 2;
        let y = area.y + area.height / 2;
        buf.set_stringn(x, y, &caption, area.width as usize, style);
    }
}
