use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::index::sort_records;
use crate::model::{NoteMeta, SortKey};
use crate::store::NoteStore;

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub include_deleted: bool,
    pub sort: SortKey,
    pub query: Option<String>,
}

pub fn run<P: PassphraseSource>(store: &NoteStore<P>, query: &ListQuery) -> Result<Vec<NoteMeta>> {
    store.ensure_ready()?;
    let mut notes = store.index().list(store.records(), query.include_deleted)?;
    if let Some(q) = query.query.as_deref() {
        notes = search(store, notes, q);
    }
    Ok(sort_records(notes, query.sort))
}

/// Case-insensitive substring filter.
///
/// Filename and title are checked first; only records that miss there have
/// their content read (and decrypted). Notes whose content cannot be read are
/// left out.
pub fn search<P: PassphraseSource>(
    store: &NoteStore<P>,
    notes: Vec<NoteMeta>,
    query: &str,
) -> Vec<NoteMeta> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return notes;
    }
    notes
        .into_iter()
        .filter(|meta| {
            if meta.filename.to_lowercase().contains(&needle)
                || meta.title.to_lowercase().contains(&needle)
            {
                return true;
            }
            content_matches(store, &meta.id, &needle)
        })
        .collect()
}

fn content_matches<P: PassphraseSource>(store: &NoteStore<P>, id: &str, needle: &str) -> bool {
    let located = match store.records().find(id) {
        Ok(Some(located)) => located,
        Ok(None) => return false,
        Err(e) => {
            tracing::debug!(note_id = %id, error = %e, "search skipped note");
            return false;
        }
    };
    if located.content_path.is_none() {
        return false;
    }
    match store.read_content_strict(&located) {
        Ok(text) => text.to_lowercase().contains(needle),
        Err(e) => {
            tracing::debug!(note_id = %id, error = %e, "search skipped unreadable note");
            false
        }
    }
}
