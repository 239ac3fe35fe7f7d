//! Pagination response envelope.

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, PageRequest};

/// Response envelope wrapping one page of items.
///
/// `next_cursor` is present only when more items exist beyond this page, so
/// clients can loop until it disappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items for this page, in stable listing order.
    pub items: Vec<T>,
    /// Opaque token for the next page, absent on the final page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Slice one page out of a fully materialised listing.
    ///
    /// Suited to adapters that already hold the complete result in memory;
    /// database-backed adapters should page at the query instead and use
    /// [`Page::from_window`].
    #[must_use]
    pub fn from_listing(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len();
        let window: Vec<T> = items
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();
        let consumed = request.offset().saturating_add(window.len());
        let next_cursor = (consumed < total).then(|| request.next_cursor(window.len()).encode());
        Self {
            items: window,
            next_cursor,
        }
    }

    /// Wrap an already-windowed page, given whether further items remain.
    #[must_use]
    pub fn from_window(items: Vec<T>, request: PageRequest, has_more: bool) -> Self {
        let next_cursor = has_more.then(|| request.next_cursor(items.len()).encode());
        Self { items, next_cursor }
    }
}
