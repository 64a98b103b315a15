use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::Note;
use crate::store::NoteStore;

/// Metadata plus readable content. Trashed notes are returned too.
pub fn run<P: PassphraseSource>(store: &NoteStore<P>, id: &str) -> Result<Note> {
    store.ensure_ready()?;
    let located = store.find_required(id)?;
    store.load_note(&located)
}
