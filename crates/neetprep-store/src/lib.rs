//! neetprep-store — Backends for the question bank and result history.
//!
//! Implements the `QuestionBank`, `HistoryStore` and `AuthProvider` traits
//! over the Firebase Realtime Database REST API, a local data directory and
//! an in-memory store, plus the configuration that picks one of them.

pub mod auth;
pub mod config;
pub mod error;
pub mod file;
pub mod firebase;
pub mod memory;

pub use auth::StaticAuth;
pub use config::{create_store, load_config_from, Backend, NeetprepConfig, StoreConfig};
pub use file::FileStore;
pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
