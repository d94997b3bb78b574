//! Durable per-item status, persisted as one human-readable JSON object:
//!
//! ```json
//! {
//!   "3": {
//!     "status": "failed",
//!     "last_updated": "2024-05-01 21:14:09",
//!     "info": { "url": "https://…/index.m3u8", "error": "no segments downloaded (12 of 12 failed)" }
//!   }
//! }
//! ```

mod natural;
mod store;
mod types;

#[cfg(test)]
mod tests;

pub use natural::natural_cmp;
pub use store::{TaskMap, TaskStateStore};
pub use types::{now_timestamp, TaskInfo, TaskRecord, TaskStatus, TIMESTAMP_FORMAT};
