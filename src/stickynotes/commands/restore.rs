use super::Transition;
use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::Area;
use crate::store::NoteStore;

/// Bring a trashed note back: to the journal if its subject says so, otherwise
/// to the active notes. Notes outside the trash are left alone.
pub fn run<P: PassphraseSource>(store: &NoteStore<P>, id: &str) -> Result<Transition> {
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let located = store.find_required(id)?;
    if !located.in_trash() {
        return Ok(Transition {
            meta: located.meta,
            changed: false,
        });
    }

    let target = if located.meta.is_journal() {
        Area::Journal
    } else {
        Area::Active
    };
    let mut moved = store.records().move_to(&located, target)?;
    moved.meta.deleted = false;
    moved.meta.touch();
    store.commit_meta(&moved)?;

    tracing::info!(event = "note_restored", note_id = %id, to = %target, "note restored");
    Ok(Transition {
        meta: moved.meta,
        changed: true,
    })
}
