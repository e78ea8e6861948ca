//! # localnoteapp
//!
//! Core library for localnote, a local-first note store. Notes live entirely
//! on the user's machine in one of several interchangeable backends, with a
//! lossless migration path between them. This crate is UI-agnostic: the CLI
//! in `crates/localnote` is just one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Clients (CLI, anything else)                               │
//! │  - Parse input, format output, own all terminal I/O         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Service (service.rs)                                       │
//! │  - One cached backend handle, opened from configuration     │
//! │  - Retry with handle invalidation on transient failures     │
//! └──────────────┬──────────────────────┬───────────────────────┘
//!                │                      │
//!                ▼                      ▼
//! ┌───────────────────────────┐  ┌─────────────────────────────┐
//! │  Migration (migration.rs) │  │  Backup (backup.rs)         │
//! │  - Copy, verify, replace, │  │  - Versioned JSON envelope  │
//! │    roll back              │  │  - Partial-failure import   │
//! └─────────────┬─────────────┘  └─────────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - NoteBackend trait: SQLite, key-value file, directory     │
//! │  - BackendFactory keyed on the configured StorageType       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module overview
//!
//! - [`model`]: [`Note`](model::Note) and friends
//! - [`store`]: the backend contract and its implementations
//! - [`service`]: the façade clients talk to
//! - [`config`]: backend selection and advisory settings
//! - [`migration`]: moving the note set between backends
//! - [`backup`]: portable export/import
//! - [`error`]: error types

pub mod backup;
pub mod config;
pub mod error;
pub mod migration;
pub mod model;
pub mod service;
pub mod store;

pub use config::{ConfigStore, StorageConfig, StorageType};
pub use error::{NoteError, Result};
pub use migration::{MigrationEngine, StorageHealth};
pub use model::{Note, NoteUpdate};
pub use service::StorageService;
pub use store::{BackendFactory, FsBackendFactory, NoteBackend, StoragePaths};
