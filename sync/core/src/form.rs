//! Input Gate
//!
//! The three venue login fields and the derived "submit enabled" signal.
//! The only rule is that every field is non-empty after trimming; there are no
//! format or length checks.

use serde::{Deserialize, Serialize};

/// One of the required form inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormField {
    /// Venue identifier (e.g. "SSE")
    VenueId,
    /// Venue login ID
    Username,
    /// Venue PIN
    Pin,
}

impl FormField {
    /// All fields in display order
    pub const ALL: [FormField; 3] = [Self::VenueId, Self::Username, Self::Pin];

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::VenueId => "Venue ID",
            Self::Username => "User ID",
            Self::Pin => "PIN",
        }
    }

    /// Whether the value should be masked when displayed
    #[must_use]
    pub fn is_secret(self) -> bool {
        matches!(self, Self::Pin)
    }
}

/// Current values of the sync form
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyncForm {
    venue_id: String,
    username: String,
    pin: String,
}

impl SyncForm {
    /// Create an empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value. Always succeeds.
    pub fn update(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::VenueId => self.venue_id = value,
            FormField::Username => self.username = value,
            FormField::Pin => self.pin = value,
        }
    }

    /// Current value of a field, as entered
    #[must_use]
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::VenueId => &self.venue_id,
            FormField::Username => &self.username,
            FormField::Pin => &self.pin,
        }
    }

    /// True iff every field is non-empty after trimming
    #[must_use]
    pub fn is_valid(&self) -> bool {
        FormField::ALL
            .iter()
            .all(|field| !self.value(*field).trim().is_empty())
    }

    /// Fields that are still blank, in display order
    #[must_use]
    pub fn missing_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|field| self.value(*field).trim().is_empty())
            .collect()
    }
}

impl std::fmt::Debug for SyncForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncForm")
            .field("venue_id", &self.venue_id)
            .field("username", &self.username)
            .field("pin", &"<redacted>")
            .finish()
    }
}
