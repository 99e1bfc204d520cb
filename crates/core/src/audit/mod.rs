//! Audit trail of created stories.
//!
//! Append-only: rows are inserted once, after the story exists, and never
//! updated or deleted.

mod recorder;
mod sqlite;
mod store;

pub use recorder::*;
pub use sqlite::*;
pub use store::*;
