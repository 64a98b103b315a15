use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::store::NoteStore;

/// Regenerate the index from disk. Returns the number of records.
pub fn run<P: PassphraseSource>(store: &NoteStore<P>) -> Result<usize> {
    store.ensure_ready()?;
    Ok(store.index().rebuild(store.records())?.len())
}
