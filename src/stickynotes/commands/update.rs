use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::{MetaPatch, NoteMeta};
use crate::store::alloc::rename_basename;
use crate::store::NoteStore;

/// Apply a metadata patch.
///
/// `user_title` renames both files to a new slug, keeping the id and the
/// creation stamp; it also sets the display title and wins over `title`.
/// A non-empty patch bumps `rev` and `updated` exactly once, however many
/// fields it touches. An empty patch changes nothing.
pub fn run<P: PassphraseSource>(
    store: &NoteStore<P>,
    id: &str,
    patch: &MetaPatch,
) -> Result<NoteMeta> {
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let mut located = store.find_active(id)?;
    if patch.is_empty() {
        return Ok(located.meta);
    }

    if let Some(pinned) = patch.pinned {
        located.meta.pinned = pinned;
    }

    if let Some(user_title) = &patch.user_title {
        let basename = rename_basename(&located.meta.filename, id, user_title);
        located = store.records().rename(&located, &basename)?;
        located.meta.title = user_title.trim().to_string();
        tracing::info!(event = "note_renamed", note_id = %id, filename = %located.meta.filename, "note renamed");
    } else if let Some(title) = &patch.title {
        located.meta.title = title.trim().to_string();
    }

    if let Some(subject) = &patch.subject {
        located.meta.subject = subject.trim().to_string();
    }

    located.meta.touch();
    store.commit_meta(&located)?;
    tracing::info!(event = "note_meta_updated", note_id = %id, title = %located.meta.title, "note metadata updated");
    Ok(located.meta)
}
