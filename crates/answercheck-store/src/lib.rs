//! answercheck-store — Submission store and task catalog clients.
//!
//! Implements the `TaskCatalog` and `SubmissionStore` traits for a PostgREST
//! (Supabase) backend and for in-memory JSON snapshots, plus a decorator that
//! logs every failed store call.

pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod postgrest;

pub use config::{create_store, load_config, AnswercheckConfig, StoreConfig};
pub use error::StoreError;
pub use logging::LoggingStore;
pub use memory::{InMemoryStore, StoreSnapshot};
pub use postgrest::PostgrestStore;
