//! Result storage
//!
//! Finished results go to a `ResultStore`. Two implementations:
//! - `MemoryResultStore` for tests and throwaway sessions
//! - `JsonlResultStore`, an append-only JSONL file with an in-memory cache

mod jsonl;
mod memory;
mod summary;
mod traits;

pub use jsonl::JsonlResultStore;
pub use memory::MemoryResultStore;
pub use summary::{GameSummary, summarize};
pub use traits::{ResultQuery, ResultStore, StoredResult};
