//! Widgets
//!
//! Screen layout and the widgets it is built from.
//!
//! ```text
//!  ABI Shift Sync
//!  All fields required
//!
//!  › Venue ID      SSE
//!    User ID       U1
//!    PIN           ••••
//!    Google token  signed in
//!
//!  [        ⠙ Logging into ABI...        ]
//!
//!  Connecting...
//!  Logging into ABI...
//!
//!  syncing | Tab next field | Enter sync | Esc cancel | Ctrl-C quit
//! ```

mod form;
mod status_log;
mod sync_button;

pub use form::{FormPanel, FORM_HEIGHT};
pub use status_log::StatusLog;
pub use sync_button::SyncButton;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use shift_sync_core::StatusView;

use crate::display::DisplayState;
use crate::input::FormInput;
use crate::theme::{notify_style, DIM_GRAY, TEXT_LIGHT, TEXT_VALUE};

/// Everything one frame needs
pub struct Screen<'a> {
    /// Mirrored conductor output
    pub display: &'a DisplayState,
    /// Form buffers and focus
    pub input: &'a FormInput,
    /// Presenter output
    pub view: &'a StatusView,
    /// A credential is held
    pub has_credential: bool,
    /// Animation frame
    pub tick: usize,
}

/// Draw the whole screen
pub fn draw(frame: &mut Frame, screen: &Screen<'_>) {
    let area = frame.area().inner(ratatui::layout::Margin::new(2, 1));

    let [title, subtitle, form, button, log, notice, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(FORM_HEIGHT),
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new("ABI Shift Sync")
            .style(Style::default().fg(TEXT_LIGHT).add_modifier(Modifier::BOLD)),
        title,
    );
    frame.render_widget(
        Paragraph::new("All fields required")
            .style(Style::default().fg(DIM_GRAY).add_modifier(Modifier::ITALIC)),
        subtitle,
    );

    frame.render_widget(FormPanel::new(screen.input, screen.has_credential), form);
    if !screen.view.spinner_visible {
        frame.set_cursor_position(FormPanel::cursor(form, screen.input));
    }

    let button = Rect {
        y: button.y + 1,
        height: 1,
        ..button
    };
    frame.render_widget(SyncButton::new(screen.view, screen.tick), button);

    frame.render_widget(
        StatusLog::new(&screen.display.history)
            .style(Style::default().fg(DIM_GRAY))
            .latest_style(Style::default().fg(TEXT_VALUE)),
        log,
    );

    if let Some(ref notification) = screen.display.notification {
        frame.render_widget(
            Paragraph::new(notification.message.as_str()).style(notify_style(notification.level)),
            notice,
        );
    }

    frame.render_widget(
        Paragraph::new(Line::from(status_bar(screen))).style(Style::default().fg(DIM_GRAY)),
        status,
    );
}

/// Bottom status bar text
fn status_bar(screen: &Screen<'_>) -> String {
    let state = screen.display.state.label();
    let hints = if screen.view.spinner_visible {
        "Esc cancel | Ctrl-C quit"
    } else {
        "Tab next field | Enter sync | Ctrl-L sign out | Ctrl-C quit"
    };
    match screen.display.last_summary {
        Some(summary) if summary.decode_errors > 0 => format!(
            "{state} | {} skipped update(s) | {hints}",
            summary.decode_errors
        ),
        _ => format!("{state} | {hints}"),
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use shift_sync_core::{render, SyncMessage, SyncSnapshot, SyncState};

    use super::*;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_draw_ready_screen() {
        let display = DisplayState::new("Ready to Sync");
        let input = FormInput::new();
        let view = render(&SyncSnapshot {
            state: SyncState::Ready,
            status_text: "Ready to Sync".to_string(),
            has_credential: true,
            form_valid: true,
        });

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| {
                draw(
                    frame,
                    &Screen {
                        display: &display,
                        input: &input,
                        view: &view,
                        has_credential: true,
                        tick: 0,
                    },
                );
            })
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("ABI Shift Sync"));
        assert!(text.contains("Sync to Google Calendar"));
        assert!(text.contains("signed in"));
    }

    #[test]
    fn test_draw_syncing_screen_shows_history_and_notice() {
        let mut display = DisplayState::new("Ready to Sync");
        display.apply_message(SyncMessage::State {
            state: SyncState::Connecting,
        });
        display.apply_message(SyncMessage::Status {
            text: "Connecting...".to_string(),
        });
        display.apply_message(SyncMessage::Notify {
            level: shift_sync_core::NotifyLevel::Warning,
            message: "Malformed status payload".to_string(),
        });
        let input = FormInput::new();
        let view = StatusView {
            text: "Connecting...".to_string(),
            spinner_visible: true,
            disabled: true,
        };

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| {
                draw(
                    frame,
                    &Screen {
                        display: &display,
                        input: &input,
                        view: &view,
                        has_credential: true,
                        tick: 1,
                    },
                );
            })
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("⠙ Connecting..."));
        assert!(text.contains("Malformed status payload"));
        assert!(text.contains("connecting | Esc cancel"));
    }
}
