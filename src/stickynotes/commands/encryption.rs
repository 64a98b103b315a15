//! Passphrase management and per-note encryption.
//!
//! A note's `encrypted` flag and the shape of its content file always agree:
//! every transition reads content under the current flag and writes it under
//! the new one before the metadata is saved. Content that cannot be decrypted
//! is never rewritten, so a wrong key cannot turn a note into placeholder text.

use crate::crypto::PassphraseSource;
use crate::error::{NoteError, Result};
use crate::model::{Area, NoteMeta};
use crate::store::records::Located;
use crate::store::NoteStore;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncryptionStatus {
    pub has_key: bool,
    /// Encrypted notes outside the trash. Only counted when a key is set.
    pub encrypted_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisableReport {
    pub decrypted: usize,
    pub errors: usize,
}

pub fn status<P: PassphraseSource>(store: &NoteStore<P>) -> Result<EncryptionStatus> {
    store.ensure_ready()?;
    let has_key = store.gate().is_enabled()?;
    let encrypted_count = if has_key {
        store
            .index()
            .list(store.records(), false)?
            .iter()
            .filter(|m| m.encrypted)
            .count()
    } else {
        0
    };
    Ok(EncryptionStatus {
        has_key,
        encrypted_count,
    })
}

/// Set or change the passphrase. Returns `true` when an existing key was
/// replaced, which leaves notes encrypted under the old key unreadable.
pub fn set<P: PassphraseSource>(
    store: &NoteStore<P>,
    passphrase: &str,
    current: Option<&str>,
) -> Result<bool> {
    let key_changed = store.gate().set_passphrase(passphrase, current)?;
    if key_changed {
        tracing::warn!(event = "encryption_key_changed", "encryption passphrase replaced");
    } else {
        tracing::info!(event = "encryption_settings_saved", "encryption passphrase saved");
    }
    Ok(key_changed)
}

/// Decrypt every encrypted note in every area, then remove the key.
///
/// Notes that fail to decrypt are counted and left encrypted.
pub fn disable<P: PassphraseSource>(store: &NoteStore<P>, current: &str) -> Result<DisableReport> {
    store.gate().verify(current)?;
    store.ensure_ready()?;

    let mut report = DisableReport::default();
    {
        let _lock = store.lock_notes()?;
        for area in Area::ALL {
            for located in store.records().scan_area(area)? {
                if !located.meta.encrypted {
                    continue;
                }
                let id = located.meta.id.clone();
                let had_content = located.content_path.is_some();
                match transition(store, located, false) {
                    Ok(_) if had_content => report.decrypted += 1,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(note_id = %id, error = %e, "could not decrypt note");
                        report.errors += 1;
                    }
                }
            }
        }
        // Cleared under the lock so no note can be encrypted after the sweep.
        store.gate().clear_passphrase()?;
    }

    tracing::info!(
        event = "encryption_disabled",
        decrypted = report.decrypted,
        errors = report.errors,
        "encryption disabled"
    );
    Ok(report)
}

/// Encrypt or decrypt one note. Asking for the state it is already in succeeds
/// without changes.
pub fn toggle<P: PassphraseSource>(store: &NoteStore<P>, id: &str, want: bool) -> Result<NoteMeta> {
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let located = store.find_active(id)?;
    if located.meta.encrypted == want {
        return Ok(located.meta);
    }
    if want && !store.gate().is_enabled()? {
        return Err(NoteError::NoKeyConfigured);
    }
    let meta = transition(store, located, want)?;
    tracing::info!(event = "note_encrypt_toggle", note_id = %id, encrypted = want, "note encryption toggled");
    Ok(meta)
}

/// Rewrite a note's content under a new flag and commit. Caller holds the notes lock.
pub(crate) fn transition<P: PassphraseSource>(
    store: &NoteStore<P>,
    mut located: Located,
    encrypted: bool,
) -> Result<NoteMeta> {
    if located.content_path.is_some() || encrypted {
        let plaintext = store.read_content_strict(&located)?;
        let target = located.content_target()?;
        store.write_content(&target, &plaintext, encrypted)?;
        located.content_path = Some(target);
    }
    located.meta.encrypted = encrypted;
    located.meta.touch();
    store.commit_meta(&located)?;
    Ok(located.meta)
}
