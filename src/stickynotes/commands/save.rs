use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::normalize_citations;
use crate::store::NoteStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub rev: u64,
    pub updated: DateTime<Utc>,
    /// The caller's revision hint, echoed back. It is not checked against `rev`.
    pub base_rev: Option<u64>,
}

/// Replace a note's content, encrypting it if the note is encrypted.
pub fn run<P: PassphraseSource>(
    store: &NoteStore<P>,
    id: &str,
    text: &str,
    base_rev: Option<u64>,
) -> Result<SaveOutcome> {
    store.ensure_ready()?;
    let content = normalize_citations(text);

    let _lock = store.lock_notes()?;
    let mut located = store.find_active(id)?;
    let target = located.content_target()?;

    store.write_content(&target, &content, located.meta.encrypted)?;
    located.content_path = Some(target);
    located.meta.touch();
    store.commit_meta(&located)?;

    tracing::info!(
        event = "note_saved",
        note_id = %id,
        rev = located.meta.rev,
        encrypted = located.meta.encrypted,
        "note content saved"
    );
    Ok(SaveOutcome {
        rev: located.meta.rev,
        updated: located.meta.updated,
        base_rev,
    })
}
