//! Shared validated label for entity names and titles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted label length.
pub const LABEL_MAX: usize = 80;

/// Validation errors raised by [`Label::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValidationError {
    /// The label was blank once trimmed.
    Empty,
    /// The label exceeded [`LABEL_MAX`] characters.
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

impl fmt::Display for LabelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "label must not be empty"),
            Self::TooLong { max } => write!(f, "label must be at most {max} characters"),
        }
    }
}

impl std::error::Error for LabelValidationError {}

/// Non-blank, bounded-length name for categories, clubs, events, and teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Validate and construct a [`Label`] from owned input.
    pub fn new(label: impl Into<String>) -> Result<Self, LabelValidationError> {
        Self::from_owned(label.into())
    }

    fn from_owned(label: String) -> Result<Self, LabelValidationError> {
        if label.trim().is_empty() {
            return Err(LabelValidationError::Empty);
        }
        if label.chars().count() > LABEL_MAX {
            return Err(LabelValidationError::TooLong { max: LABEL_MAX });
        }
        Ok(Self(label))
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Label> for String {
    fn from(value: Label) -> Self {
        value.0
    }
}

impl TryFrom<String> for Label {
    type Error = LabelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Chess Society", true)]
    #[case("  ", false)]
    fn label_cases(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(Label::new(raw).is_ok(), expected);
    }

    #[test]
    fn overlong_labels_are_rejected() {
        assert_eq!(
            Label::new("x".repeat(LABEL_MAX + 1)),
            Err(LabelValidationError::TooLong { max: LABEL_MAX })
        );
    }
}
