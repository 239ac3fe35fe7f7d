//! Hierarchical document addressing and the document envelope.
//!
//! The platform's persistence is a remote document store addressed by
//! alternating collection/document path segments, e.g.
//! `Categories/{c}/Clubs/{l}/Events/{e}/Tickets/{t}`. Paths are built through
//! typed constructors so handlers and sagas cannot fabricate malformed
//! addresses; free-form parsing exists only for the WebSocket subscribe frame
//! and validates shape before use.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ids::{
    BugReportId, CategoryId, ChatId, ClubId, EventId, TeamId, TicketId, UserId,
};

const SEPARATOR: char = '/';

/// Document field names for the denormalised reference lists.
///
/// One place to spell them so the saga plans and the reconciler cannot
/// disagree about the schema.
pub mod fields {
    /// Category field mirroring the `Clubs` sub-collection.
    pub const CATEGORY_CLUB_IDS: &str = "clubIds";
    /// Club field mirroring the `Events` sub-collection.
    pub const CLUB_EVENT_IDS: &str = "eventIds";
    /// Club field mirroring the `Members` sub-collection.
    pub const CLUB_MEMBER_IDS: &str = "memberIds";
    /// Event field mirroring the `Tickets` sub-collection.
    pub const EVENT_TICKET_IDS: &str = "ticketIds";
    /// Event field mirroring the `Teams` sub-collection.
    pub const EVENT_TEAM_IDS: &str = "teamIds";
    /// User field mirroring joined clubs.
    pub const USER_CLUBS: &str = "clubs";
    /// User field mirroring issued tickets.
    pub const USER_TICKETS: &str = "tickets";
}

/// Validation errors for paths parsed from free-form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path contained no segments.
    Empty,
    /// A segment between separators was blank.
    BlankSegment,
    /// A document path must hold an even number of segments.
    OddSegments,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "path must not be empty"),
            Self::BlankSegment => write!(f, "path segments must not be blank"),
            Self::OddSegments => {
                write!(f, "document paths must alternate collection and document segments")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Address of a collection in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Top-level users collection.
    pub fn users() -> Self {
        Self("Users".to_owned())
    }

    /// Tickets held under a user document.
    pub fn user_tickets(user: &UserId) -> Self {
        Self(format!("Users{SEPARATOR}{user}{SEPARATOR}Tickets"))
    }

    /// Top-level categories collection.
    pub fn categories() -> Self {
        Self("Categories".to_owned())
    }

    /// Clubs under a category.
    pub fn clubs(category: &CategoryId) -> Self {
        Self(format!("Categories{SEPARATOR}{category}{SEPARATOR}Clubs"))
    }

    /// Membership records under a club.
    pub fn members(category: &CategoryId, club: &ClubId) -> Self {
        Self(format!(
            "Categories{SEPARATOR}{category}{SEPARATOR}Clubs{SEPARATOR}{club}{SEPARATOR}Members"
        ))
    }

    /// Events under a club.
    pub fn events(category: &CategoryId, club: &ClubId) -> Self {
        Self(format!(
            "Categories{SEPARATOR}{category}{SEPARATOR}Clubs{SEPARATOR}{club}{SEPARATOR}Events"
        ))
    }

    /// Tickets registered under an event.
    pub fn event_tickets(category: &CategoryId, club: &ClubId, event: &EventId) -> Self {
        Self(format!(
            "Categories{SEPARATOR}{category}{SEPARATOR}Clubs{SEPARATOR}{club}{SEPARATOR}Events{SEPARATOR}{event}{SEPARATOR}Tickets"
        ))
    }

    /// Teams registered under an event.
    pub fn teams(category: &CategoryId, club: &ClubId, event: &EventId) -> Self {
        Self(format!(
            "Categories{SEPARATOR}{category}{SEPARATOR}Clubs{SEPARATOR}{club}{SEPARATOR}Events{SEPARATOR}{event}{SEPARATOR}Teams"
        ))
    }

    /// Top-level chats collection.
    pub fn chats() -> Self {
        Self("Chats".to_owned())
    }

    /// Top-level bug report collection.
    pub fn bug_reports() -> Self {
        Self("BugReports".to_owned())
    }

    /// Address a document inside this collection.
    pub fn doc(&self, id: impl AsRef<str>) -> DocPath {
        DocPath {
            collection: self.clone(),
            doc_id: id.as_ref().to_owned(),
        }
    }
}

impl AsRef<str> for CollectionPath {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Address of a single document in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    collection: CollectionPath,
    doc_id: String,
}

impl DocPath {
    /// `Users/{user}`.
    pub fn user(user: &UserId) -> Self {
        CollectionPath::users().doc(user)
    }

    /// `Users/{user}/Tickets/{ticket}`.
    pub fn user_ticket(user: &UserId, ticket: &TicketId) -> Self {
        CollectionPath::user_tickets(user).doc(ticket)
    }

    /// `Categories/{category}`.
    pub fn category(category: &CategoryId) -> Self {
        CollectionPath::categories().doc(category)
    }

    /// `Categories/{category}/Clubs/{club}`.
    pub fn club(category: &CategoryId, club: &ClubId) -> Self {
        CollectionPath::clubs(category).doc(club)
    }

    /// `Categories/{category}/Clubs/{club}/Members/{user}`.
    pub fn membership(category: &CategoryId, club: &ClubId, user: &UserId) -> Self {
        CollectionPath::members(category, club).doc(user)
    }

    /// `Categories/{category}/Clubs/{club}/Events/{event}`.
    pub fn event(category: &CategoryId, club: &ClubId, event: &EventId) -> Self {
        CollectionPath::events(category, club).doc(event)
    }

    /// `Categories/{category}/Clubs/{club}/Events/{event}/Tickets/{ticket}`.
    pub fn event_ticket(
        category: &CategoryId,
        club: &ClubId,
        event: &EventId,
        ticket: &TicketId,
    ) -> Self {
        CollectionPath::event_tickets(category, club, event).doc(ticket)
    }

    /// `Categories/{category}/Clubs/{club}/Events/{event}/Teams/{team}`.
    pub fn team(category: &CategoryId, club: &ClubId, event: &EventId, team: &TeamId) -> Self {
        CollectionPath::teams(category, club, event).doc(team)
    }

    /// `Chats/{chat}`.
    pub fn chat(chat: &ChatId) -> Self {
        CollectionPath::chats().doc(chat)
    }

    /// `BugReports/{report}`.
    pub fn bug_report(report: &BugReportId) -> Self {
        CollectionPath::bug_reports().doc(report)
    }

    /// Parse a client-supplied path such as `Users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the input is empty, a segment is blank,
    /// or the segment count does not describe a document.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let segments: Vec<&str> = raw.split(SEPARATOR).collect();
        if segments.is_empty() || raw.is_empty() {
            return Err(PathError::Empty);
        }
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(PathError::BlankSegment);
        }
        if segments.len() % 2 != 0 {
            return Err(PathError::OddSegments);
        }
        let (doc_id, collection) = match segments.split_last() {
            Some((last, rest)) => ((*last).to_owned(), rest.join("/")),
            None => return Err(PathError::Empty),
        };
        Ok(Self {
            collection: CollectionPath(collection),
            doc_id,
        })
    }

    /// Collection holding this document.
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Identifier of the document within its collection.
    pub fn doc_id(&self) -> &str {
        self.doc_id.as_str()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.collection, self.doc_id)
    }
}

impl Serialize for DocPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Errors converting documents to and from domain entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The payload was not a JSON object.
    NotAnObject,
    /// Serialisation or deserialisation failed.
    Codec {
        /// Underlying serde failure, as text.
        message: String,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "documents must be JSON objects"),
            Self::Codec { message } => write!(f, "document codec failure: {message}"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// JSON document envelope stored at a [`DocPath`].
///
/// ## Invariants
/// - The payload is always a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Document(Value);

impl Document {
    /// Wrap a raw JSON value, rejecting non-objects.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotAnObject`] for non-object payloads.
    pub fn new(value: Value) -> Result<Self, DocumentError> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(DocumentError::NotAnObject)
        }
    }

    /// Serialise a domain entity into a document payload.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Codec`] when the entity does not serialise,
    /// or [`DocumentError::NotAnObject`] when it serialises to a non-object.
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self, DocumentError> {
        let value = serde_json::to_value(entity).map_err(|error| DocumentError::Codec {
            message: error.to_string(),
        })?;
        Self::new(value)
    }

    /// Deserialise the payload into a domain entity.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Codec`] when the payload does not match the
    /// entity shape.
    pub fn to_entity<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        serde_json::from_value(self.0.clone()).map_err(|error| DocumentError::Codec {
            message: error.to_string(),
        })
    }

    /// Borrow the raw JSON payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Read a list-of-ids field, treating absent fields as empty.
    ///
    /// Non-string entries are skipped; denormalised reference lists only ever
    /// hold id strings.
    pub fn list_field(&self, field: &str) -> Vec<String> {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        value.0
    }
}

impl TryFrom<Value> for Document {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn ids() -> (CategoryId, ClubId, EventId, TicketId, UserId) {
        (
            CategoryId::random(),
            ClubId::random(),
            EventId::random(),
            TicketId::random(),
            UserId::random(),
        )
    }

    #[test]
    fn ticket_paths_follow_the_documented_hierarchy() {
        let (category, club, event, ticket, user) = ids();
        assert_eq!(
            DocPath::event_ticket(&category, &club, &event, &ticket).to_string(),
            format!("Categories/{category}/Clubs/{club}/Events/{event}/Tickets/{ticket}")
        );
        assert_eq!(
            DocPath::user_ticket(&user, &ticket).to_string(),
            format!("Users/{user}/Tickets/{ticket}")
        );
    }

    #[test]
    fn parse_round_trips_typed_paths() {
        let (category, club, event, _, _) = ids();
        let path = DocPath::event(&category, &club, &event);
        let parsed = DocPath::parse(&path.to_string()).expect("typed paths should parse");
        assert_eq!(parsed, path);
        assert_eq!(parsed.doc_id(), event.as_ref());
    }

    #[rstest]
    #[case("", PathError::Empty)]
    #[case("Users//Tickets/T1", PathError::BlankSegment)]
    #[case("Users", PathError::OddSegments)]
    #[case("Users/U1/Tickets", PathError::OddSegments)]
    fn malformed_paths_are_rejected(#[case] raw: &str, #[case] expected: PathError) {
        assert_eq!(DocPath::parse(raw), Err(expected));
    }

    #[test]
    fn documents_must_be_objects() {
        assert_eq!(Document::new(json!([1, 2])), Err(DocumentError::NotAnObject));
        assert!(Document::new(json!({ "name": "chess" })).is_ok());
    }

    #[test]
    fn list_fields_default_to_empty_and_skip_non_strings() {
        let doc = Document::new(json!({ "ticketIds": ["a", 7, "b"] }))
            .expect("object payload should wrap");
        assert_eq!(doc.list_field("ticketIds"), vec!["a".to_owned(), "b".to_owned()]);
        assert!(doc.list_field("memberIds").is_empty());
    }
}
