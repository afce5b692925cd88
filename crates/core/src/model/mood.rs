use thiserror::Error;

/// Question ids starting with this prefix are reserved for session-level
/// capture fields and rejected at template validation.
pub const RESERVED_KEY_PREFIX: &str = "_";

/// Answer-map key the mood rating is merged under at completion.
pub const MOOD_VALUE_KEY: &str = "_sessionMood";

/// Answer-map key the mood note is merged under at completion.
pub const MOOD_NOTE_KEY: &str = "_moodNote";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MoodError {
    #[error("mood value must be between 1 and 5, got {provided}")]
    OutOfRange { provided: u8 },
}

/// The fixed check-in collected at the end of every session, independent of
/// template content: a 1-5 mood rating plus an optional free-form note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodCapture {
    value: u8,
    note: String,
}

impl MoodCapture {
    /// Creates a mood capture.
    ///
    /// # Errors
    ///
    /// Returns `MoodError::OutOfRange` unless `value` is within 1..=5.
    pub fn new(value: u8, note: impl Into<String>) -> Result<Self, MoodError> {
        if !(1..=5).contains(&value) {
            return Err(MoodError::OutOfRange { provided: value });
        }
        Ok(Self {
            value,
            note: note.into().trim().to_owned(),
        })
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }
}
