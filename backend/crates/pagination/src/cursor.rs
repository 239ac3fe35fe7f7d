//! Opaque pagination cursor encoding and request normalisation.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Page size applied when a request does not name one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on the page size a client may request.
pub const MAX_PAGE_SIZE: usize = 100;

const CURSOR_VERSION: u32 = 1;

/// Errors raised while decoding a client-supplied cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token was not valid URL-safe base64.
    #[error("cursor is not valid base64")]
    Encoding,
    /// The decoded payload was not the expected JSON shape.
    #[error("cursor payload is malformed")]
    Payload,
    /// The payload version is newer than this backend understands.
    #[error("cursor version {version} is not supported")]
    UnsupportedVersion {
        /// Version found in the decoded payload.
        version: u32,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    v: u32,
    o: usize,
}

/// Opaque cursor naming the offset of the next page.
///
/// The wire form is URL-safe base64 over a versioned JSON payload. Clients
/// must treat the token as opaque; the payload shape is a backend concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    offset: usize,
}

impl Cursor {
    /// Build a cursor pointing at the given item offset.
    #[must_use]
    pub const fn at_offset(offset: usize) -> Self {
        Self { offset }
    }

    /// Offset of the first item the cursor refers to.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Encode the cursor into its opaque wire form.
    #[must_use]
    pub fn encode(self) -> String {
        let payload = CursorPayload {
            v: CURSOR_VERSION,
            o: self.offset,
        };
        // Serialising a two-field struct of plain integers cannot fail.
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decode a client-supplied token.
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] when the token is not base64, the payload is
    /// not the expected JSON shape, or the version is unknown.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| CursorError::Encoding)?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|_| CursorError::Payload)?;
        if payload.v != CURSOR_VERSION {
            return Err(CursorError::UnsupportedVersion { version: payload.v });
        }
        Ok(Self { offset: payload.o })
    }
}

/// Normalised pagination inputs for a list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request from an optional cursor token and page-size hint.
    ///
    /// The limit is clamped to `1..=`[`MAX_PAGE_SIZE`]; omitted values fall
    /// back to [`DEFAULT_PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// Propagates [`CursorError`] from cursor decoding.
    pub fn from_parts(cursor: Option<&str>, limit: Option<usize>) -> Result<Self, CursorError> {
        let offset = match cursor {
            Some(token) => Cursor::decode(token)?.offset(),
            None => 0,
        };
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Ok(Self { offset, limit })
    }

    /// Build a request from a raw URL query string.
    ///
    /// Recognises `cursor` and `limit` parameters; unknown parameters are
    /// ignored and a malformed `limit` falls back to the default.
    ///
    /// # Errors
    ///
    /// Propagates [`CursorError`] from cursor decoding.
    pub fn from_query(query: &str) -> Result<Self, CursorError> {
        let mut cursor = None;
        let mut limit = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "cursor" => cursor = Some(value.into_owned()),
                "limit" => limit = value.as_ref().parse::<usize>().ok(),
                _ => {}
            }
        }
        Self::from_parts(cursor.as_deref(), limit)
    }

    /// Offset of the first item to return.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Maximum number of items to return.
    #[must_use]
    pub const fn limit(self) -> usize {
        self.limit
    }

    /// Cursor for the page following this one, given the items returned.
    #[must_use]
    pub const fn next_cursor(self, returned: usize) -> Cursor {
        Cursor::at_offset(self.offset + returned)
    }
}
