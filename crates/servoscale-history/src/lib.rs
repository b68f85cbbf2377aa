//! servoscale-history — bounded per-task recommendation history.
//!
//! Backed by [redb](https://docs.rs/redb), supports persistent and
//! in-memory operation. Each task's history is a newest-first list of
//! anomaly/recovery events capped at ten entries.
//!
//! The `HistoryStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{HistoryError, HistoryResult};
pub use store::{HISTORY_CAP, HistoryStore, result_key};
