//! Document store adapters.
//!
//! Only the in-memory adapter ships here. The production adapter for the
//! managed document service lives outside this repository; everything in the
//! backend reaches the store through the [`crate::domain::ports::DocumentStore`]
//! port, so swapping the adapter is a composition-root concern.

mod memory;

#[cfg(any(test, feature = "test-support"))]
pub use memory::StoreFault;
pub use memory::MemoryDocumentStore;
