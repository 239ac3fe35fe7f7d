//! User data model.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{ClubId, EventId, TicketId, UserId};

/// Validation errors raised by user component constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Display name was blank once trimmed.
    EmptyDisplayName,
    /// Display name fell below the minimum length.
    DisplayNameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Display name exceeded the maximum length.
    DisplayNameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Display name used characters outside the allowed set.
    DisplayNameInvalidCharacters,
    /// Email address was blank or structurally invalid.
    InvalidEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooShort { min } => {
                write!(f, "display name must be at least {min} characters")
            }
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::DisplayNameInvalidCharacters => write!(
                f,
                "display name may only contain letters, numbers, spaces, or underscores",
            ),
            Self::InvalidEmail => write!(f, "email address is not valid"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 3;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 32;

static DISPLAY_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn display_name_regex() -> &'static Regex {
    DISPLAY_NAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[A-Za-z0-9_ ]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("display name regex failed to compile: {error}"))
    })
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }

        let length = display_name.chars().count();
        if length < DISPLAY_NAME_MIN {
            return Err(UserValidationError::DisplayNameTooShort {
                min: DISPLAY_NAME_MIN,
            });
        }
        if length > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }

        if !display_name_regex().is_match(&display_name) {
            return Err(UserValidationError::DisplayNameInvalidCharacters);
        }

        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Email address captured at signup.
///
/// Validation is structural only (one `@`, no whitespace); deliverability is
/// the identity provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        let trimmed = email.trim();
        if trimmed.is_empty() || trimmed != email {
            return Err(UserValidationError::InvalidEmail);
        }
        if email.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        match email.split_once('@') {
            Some((local, host)) if !local.is_empty() && host.contains('.') => Ok(Self(email)),
            _ => Err(UserValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Platform-wide role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform administrator; may manage any category, club, or event.
    Admin,
    /// Regular member.
    Member,
}

/// Application user.
///
/// Carries denormalised reference lists mirroring the authoritative child
/// collections (`clubs`, `events`, `tickets`). Those lists are maintained by
/// the write sequencer and may drift under partial failure; the reconciler
/// repairs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "Ada Lovelace")]
    display_name: DisplayName,
    #[schema(value_type = String, example = "ada@clubhub.example")]
    email: EmailAddress,
    role: Role,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    clubs: Vec<ClubId>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    events: Vec<EventId>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    tickets: Vec<TicketId>,
}

impl User {
    /// Build a new [`User`] with empty reference lists.
    pub fn new(id: UserId, display_name: DisplayName, email: EmailAddress, role: Role) -> Self {
        Self {
            id,
            display_name,
            email,
            role,
            clubs: Vec::new(),
            events: Vec::new(),
            tickets: Vec::new(),
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name shown to other users.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Email address captured at signup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Platform-wide role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Denormalised list of joined club ids.
    pub fn clubs(&self) -> &[ClubId] {
        &self.clubs
    }

    /// Denormalised list of registered event ids.
    pub fn events(&self) -> &[EventId] {
        &self.events
    }

    /// Denormalised list of issued ticket ids.
    pub fn tickets(&self) -> &[TicketId] {
        &self.tickets
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ab", false)]
    #[case("Alice_Bob 123", true)]
    #[case("bad$char", false)]
    fn display_name_cases(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(DisplayName::new(name).is_ok(), expected);
    }

    #[test]
    fn overlong_display_names_are_rejected() {
        let err = DisplayName::new("a".repeat(DISPLAY_NAME_MAX + 1))
            .expect_err("overlong names must fail");
        assert_eq!(
            err,
            UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            }
        );
    }

    #[rstest]
    #[case("ada@clubhub.example", true)]
    #[case("@clubhub.example", false)]
    #[case("ada clubhub.example", false)]
    #[case("ada@localhost", false)]
    fn email_cases(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(EmailAddress::new(email).is_ok(), expected);
    }

    #[test]
    fn users_serialise_with_upper_case_roles_and_camel_case_lists() {
        let user = User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@clubhub.example").expect("valid email"),
            Role::Admin,
        );
        let value = serde_json::to_value(&user).expect("user should serialise");
        assert_eq!(value["role"], "ADMIN");
        assert_eq!(value["displayName"], "Ada Lovelace");
        assert!(value["tickets"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn missing_reference_lists_default_to_empty() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": UserId::random().as_ref(),
            "displayName": "Ada Lovelace",
            "email": "ada@clubhub.example",
            "role": "MEMBER"
        }))
        .expect("user should deserialise");
        assert!(user.clubs().is_empty());
    }
}
