use super::encryption::transition;
use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::{NoteMeta, PdfMeta, Tlp};
use crate::store::NoteStore;

pub fn get<P: PassphraseSource>(store: &NoteStore<P>, id: &str) -> Result<PdfMeta> {
    store.ensure_ready()?;
    Ok(store.find_active(id)?.meta.pdf.normalized())
}

/// Save a note's export preferences.
///
/// Labelling a plaintext note `RED` also encrypts it when a key is configured.
/// Without a key the label is saved and the note stays plaintext. A failed
/// auto-encrypt is logged and the labelled, unencrypted note is returned.
pub fn set<P: PassphraseSource>(store: &NoteStore<P>, id: &str, pdf: &PdfMeta) -> Result<NoteMeta> {
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let mut located = store.find_active(id)?;

    located.meta.pdf = pdf.normalized();
    located.meta.touch();
    store.commit_meta(&located)?;

    if located.meta.pdf.tlp != Tlp::Red || located.meta.encrypted {
        return Ok(located.meta);
    }
    match store.gate().is_enabled() {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(note_id = %id, "TLP RED without an encryption key, note stays plaintext");
            return Ok(located.meta);
        }
        Err(e) => {
            tracing::warn!(note_id = %id, error = %e, "could not read encryption settings");
            return Ok(located.meta);
        }
    }

    let labelled = located.meta.clone();
    match transition(store, located, true) {
        Ok(meta) => {
            tracing::info!(event = "note_auto_encrypted", note_id = %id, "TLP RED note encrypted");
            Ok(meta)
        }
        Err(e) => {
            tracing::warn!(note_id = %id, error = %e, "auto-encrypt failed");
            Ok(labelled)
        }
    }
}
