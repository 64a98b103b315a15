//! # Commands
//!
//! One module per operation. Each exposes `run` (or a few named entry points)
//! taking a [`NoteStore`](crate::store::NoteStore) and returning a typed outcome.
//!
//! Every command that changes a note leaves the index consistent with disk
//! before it returns: metadata is written first, then mirrored into the index.
//! Mutations hold the notes lock for their whole read-modify-write.

use crate::model::NoteMeta;
use serde::Serialize;

pub mod create;
pub mod delete;
pub mod encryption;
pub mod export;
pub mod get;
pub mod import;
pub mod journal;
pub mod list;
pub mod pdf_settings;
pub mod rebuild;
pub mod restore;
pub mod save;
pub mod sync;
pub mod update;

/// Result of a delete or restore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub meta: NoteMeta,
    /// `false` when the note was already where it was asked to go.
    pub changed: bool,
}
