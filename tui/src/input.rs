//! Form Input
//!
//! Edit buffers and focus for the four on-screen fields. The three venue
//! fields are mirrored to the conductor on every edit; the token field is
//! only handed over when the user submits it.

use shift_sync_core::FormField;
use unicode_width::UnicodeWidthStr;

/// Mask character for secret fields
const MASK: char = '•';

/// An on-screen input field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputField {
    /// One of the venue login fields
    Form(FormField),
    /// Google access token
    Token,
}

impl InputField {
    /// Focus order
    pub const ORDER: [InputField; 4] = [
        Self::Form(FormField::VenueId),
        Self::Form(FormField::Username),
        Self::Form(FormField::Pin),
        Self::Token,
    ];

    /// Label shown next to the field
    pub fn label(self) -> &'static str {
        match self {
            Self::Form(field) => field.label(),
            Self::Token => "Google token",
        }
    }

    /// Placeholder shown while empty
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Form(FormField::VenueId) => "e.g. SSE",
            Self::Form(FormField::Username) => "venue login ID",
            Self::Form(FormField::Pin) => "venue PIN",
            Self::Token => "paste token, then Enter",
        }
    }

    /// Value is masked on screen
    pub fn is_secret(self) -> bool {
        match self {
            Self::Form(field) => field.is_secret(),
            Self::Token => true,
        }
    }

    fn index(self) -> usize {
        Self::ORDER
            .iter()
            .position(|f| *f == self)
            .unwrap_or_default()
    }
}

/// Buffers and focus for the form
#[derive(Clone, Debug)]
pub struct FormInput {
    values: [String; 4],
    focus: InputField,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            values: Default::default(),
            focus: InputField::Form(FormField::VenueId),
        }
    }
}

impl FormInput {
    /// Create an empty form with focus on the first field
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently focused field
    pub fn focus(&self) -> InputField {
        self.focus
    }

    /// Move focus to the next field, wrapping around
    pub fn focus_next(&mut self) {
        let next = (self.focus.index() + 1) % InputField::ORDER.len();
        self.focus = InputField::ORDER[next];
    }

    /// Move focus to the previous field, wrapping around
    pub fn focus_prev(&mut self) {
        let len = InputField::ORDER.len();
        let prev = (self.focus.index() + len - 1) % len;
        self.focus = InputField::ORDER[prev];
    }

    /// Raw value of a field
    pub fn value(&self, field: InputField) -> &str {
        &self.values[field.index()]
    }

    /// Replace a field's value
    pub fn set(&mut self, field: InputField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Type a character into the focused field
    pub fn push(&mut self, c: char) {
        self.values[self.focus.index()].push(c);
    }

    /// Delete the last character of the focused field
    ///
    /// Returns false if the field was already empty.
    pub fn pop(&mut self) -> bool {
        self.values[self.focus.index()].pop().is_some()
    }

    /// Take the token buffer, leaving it empty
    pub fn take_token(&mut self) -> String {
        std::mem::take(&mut self.values[InputField::Token.index()])
    }

    /// Text to draw for a field: masked for secrets
    pub fn display_value(&self, field: InputField) -> String {
        let value = self.value(field);
        if field.is_secret() {
            MASK.to_string().repeat(value.chars().count())
        } else {
            value.to_string()
        }
    }

    /// Terminal columns taken by the drawn value, for cursor placement
    pub fn display_width(&self, field: InputField) -> usize {
        self.display_value(field).width()
    }
}
