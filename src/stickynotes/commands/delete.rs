use super::Transition;
use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::Area;
use crate::store::NoteStore;

/// Move a note into the trash. Already-trashed notes are left alone.
pub fn run<P: PassphraseSource>(store: &NoteStore<P>, id: &str) -> Result<Transition> {
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let located = store.find_required(id)?;
    if located.in_trash() {
        return Ok(Transition {
            meta: located.meta,
            changed: false,
        });
    }

    let mut moved = store.records().move_to(&located, Area::Trash)?;
    moved.meta.deleted = true;
    moved.meta.touch();
    store.commit_meta(&moved)?;

    tracing::info!(event = "note_deleted", note_id = %id, from = %located.area, "note deleted");
    Ok(Transition {
        meta: moved.meta,
        changed: true,
    })
}
