//! Shared opaque cursor and pagination envelope primitives for backend
//! endpoints.
//!
//! List endpoints accept an optional opaque cursor plus a bounded page size
//! and respond with a [`Page`] envelope carrying the items and, when more
//! results exist, the cursor for the next page. Cursors are URL-safe base64
//! over a small JSON payload so clients treat them as opaque tokens while the
//! backend can evolve the payload shape behind a version field.

mod cursor;
mod envelope;

pub use cursor::{Cursor, CursorError, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use envelope::Page;
