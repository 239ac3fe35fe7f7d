//! Identifier newtypes for the platform's entities.
//!
//! Every document id is generated on the client side as a UUID, which is what
//! makes re-running a failed write sequence safe: the same input ids always
//! address the same documents. The [`define_id`] macro stamps out one
//! validated newtype per entity so ids cannot be mixed up across call sites.

use std::fmt;

use uuid::Uuid;

/// Validation errors shared by every identifier newtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// The id string was empty.
    Empty {
        /// Human-readable label of the id kind, e.g. `"club id"`.
        entity: &'static str,
    },
    /// The id string was not a valid UUID.
    Invalid {
        /// Human-readable label of the id kind, e.g. `"club id"`.
        entity: &'static str,
    },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { entity } => write!(f, "{entity} must not be empty"),
            Self::Invalid { entity } => write!(f, "{entity} must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdValidationError {}

macro_rules! define_id {
    (
        $(#[$outer:meta])*
        $name:ident => $label:literal
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid, String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
                Self::from_owned(id.as_ref().to_owned())
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                let uuid = Uuid::new_v4();
                Self(uuid, uuid.to_string())
            }

            /// Construct the identifier directly from an already-valid UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                let raw = uuid.to_string();
                Self(uuid, raw)
            }

            fn from_owned(id: String) -> Result<Self, IdValidationError> {
                if id.is_empty() {
                    return Err(IdValidationError::Empty { entity: $label });
                }
                if id.trim() != id {
                    return Err(IdValidationError::Invalid { entity: $label });
                }
                let parsed = Uuid::parse_str(&id)
                    .map_err(|_| IdValidationError::Invalid { entity: $label })?;
                Ok(Self(parsed, id))
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.1.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.1
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    };
}

define_id! {
    /// Stable user identifier stored as a UUID.
    UserId => "user id"
}

define_id! {
    /// Identifier of a category grouping clubs.
    CategoryId => "category id"
}

define_id! {
    /// Identifier of a club within a category.
    ClubId => "club id"
}

define_id! {
    /// Identifier of an event hosted by a club.
    EventId => "event id"
}

define_id! {
    /// Identifier of a ticket issued for an event.
    TicketId => "ticket id"
}

define_id! {
    /// Identifier of a team registered for an event.
    TeamId => "team id"
}

define_id! {
    /// Identifier of a chat room.
    ChatId => "chat id"
}

define_id! {
    /// Identifier of a submitted bug report.
    BugReportId => "bug report id"
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[test]
    fn ids_round_trip_through_strings() {
        let id = ClubId::random();
        let raw: String = id.clone().into();
        let parsed = ClubId::new(&raw).expect("generated ids should validate");
        assert_eq!(parsed, id);
    }

    #[rstest]
    #[case("")]
    #[case("  3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("not-a-uuid")]
    fn malformed_ids_are_rejected(#[case] raw: &str) {
        assert!(EventId::new(raw).is_err());
    }

    #[test]
    fn rejection_messages_name_the_entity() {
        let err = TicketId::new("").expect_err("empty ids must fail");
        assert_eq!(err.to_string(), "ticket id must not be empty");
    }

    #[test]
    fn serde_uses_the_string_form() {
        let id = UserId::random();
        let json = serde_json::to_string(&id).expect("ids should serialise");
        assert_eq!(json, format!("\"{id}\""));
    }
}
