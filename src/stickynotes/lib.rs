//! # stickynotes Architecture
//!
//! stickynotes is a **UI-agnostic note storage library**. Notes are plain files
//! on disk; an HTTP server, a sync worker and the bundled CLI are all clients of
//! the same library.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, shareable across threads      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - One module per operation, keeps index and disk in step   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/, index.rs, crypto.rs)                │
//! │  - Atomic writes, locks, metadata/content pairs, encryption │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Files Are the Truth
//!
//! Each note is a `<basename>.json` metadata file next to a
//! `<basename>.{md,txt,yaml,yml}` content file, in one of three area
//! directories (`notes/`, `journal/`, `trash/`). `index.json` is a cache that
//! can always be rebuilt from those files, and an unreadable index is rebuilt
//! rather than reported.
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never exits the
//! process. Diagnostics go through `tracing`; installing a subscriber is left to
//! the embedding application.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each operation
//! - [`store`]: Disk layout, atomic writes, locks and note records
//! - [`index`]: The rebuildable metadata index
//! - [`crypto`]: Passphrase handling and content encryption
//! - [`model`]: Core data types (`NoteMeta`, `Area`, `PdfMeta`)
//! - [`config`]: Layered store configuration
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod error;
pub mod index;
pub mod model;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
