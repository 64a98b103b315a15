//! # Storage Layer
//!
//! Everything that touches the data directory lives here.
//!
//! ## Design Rationale
//!
//! Note files are the source of truth and everything else is derived from them:
//! - [`records::RecordStore`] reads and moves metadata/content pairs
//! - [`crate::index::NoteIndex`] caches all metadata in one file for listing
//! - [`crate::crypto::EncryptionGate`] sits between the store and content bytes
//!
//! [`NoteStore`] bundles the three so commands can take a single handle.
//!
//! ## Write Discipline
//!
//! Every file write goes through [`atomic::write_atomic`], so a reader (or a
//! crash) observes either the old file or the new one. Mutating commands hold
//! the notes lock ([`NoteStore::lock_notes`]) around their read-modify-write of
//! metadata and around file moves; the index takes its own lock inside. The
//! order is always notes lock, then index lock.
//!
//! ## Storage Format
//!
//! ```text
//! data/
//! ├── notes/      2024-05-01_09-30-00_1a2b3c4d_Title.{json,md}
//! ├── journal/
//! ├── trash/
//! ├── exports/
//! ├── sync/
//! └── index.json
//! ```

use crate::crypto::{EncryptionGate, KdfParams, PassphraseSource, SettingsFile};
use crate::error::Result;
use crate::index::NoteIndex;
use crate::model::{Note, DECRYPTION_FAILED_PLACEHOLDER};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod alloc;
pub mod atomic;
pub mod layout;
pub mod legacy;
pub mod lock;
pub mod records;

use layout::Layout;
use lock::FileLock;
use records::{Located, RecordStore};

/// Record store, index and encryption gate over one data directory.
pub struct NoteStore<P: PassphraseSource = SettingsFile> {
    records: RecordStore,
    index: NoteIndex,
    gate: EncryptionGate<P>,
    prepared: AtomicBool,
}

impl NoteStore<SettingsFile> {
    /// Store whose passphrase lives in `<config_dir>/encryption.json`.
    pub fn open(layout: Layout, kdf: KdfParams) -> Self {
        let source = SettingsFile::new(layout.encryption_settings_path());
        Self::with_source(layout, source, kdf)
    }
}

impl<P: PassphraseSource> NoteStore<P> {
    pub fn with_source(layout: Layout, source: P, kdf: KdfParams) -> Self {
        Self {
            records: RecordStore::new(layout.clone()),
            index: NoteIndex::new(layout),
            gate: EncryptionGate::new(source, kdf),
            prepared: AtomicBool::new(false),
        }
    }

    pub fn layout(&self) -> &Layout {
        self.records.layout()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn index(&self) -> &NoteIndex {
        &self.index
    }

    pub fn gate(&self) -> &EncryptionGate<P> {
        &self.gate
    }

    /// Create the directories, and on first use run the legacy settings migration.
    pub fn ensure_ready(&self) -> Result<()> {
        self.layout().ensure_dirs()?;
        if self.prepared.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let migrated = self.migrate_legacy();
        if migrated.is_err() {
            self.prepared.store(false, Ordering::SeqCst);
        }
        migrated
    }

    fn migrate_legacy(&self) -> Result<()> {
        let _lock = self.lock_notes()?;
        if legacy::migrate_pdf_settings(&self.records)? > 0 && self.index.load().is_some() {
            self.index.rebuild(&self.records)?;
        }
        Ok(())
    }

    /// Exclusive lock for mutating note files. Take it before the index lock.
    pub fn lock_notes(&self) -> Result<FileLock> {
        FileLock::acquire(&self.layout().notes_lock_path())
    }

    /// Readable content for a located note.
    ///
    /// Encrypted content that cannot be decrypted, for whatever reason, reads as
    /// [`DECRYPTION_FAILED_PLACEHOLDER`].
    pub fn read_content(&self, located: &Located) -> Result<String> {
        let raw = RecordStore::read_raw(located)?;
        if !located.meta.encrypted || located.content_path.is_none() {
            return Ok(raw);
        }
        match self.gate.decrypt(&raw) {
            Ok(plain) => Ok(plain),
            Err(e) => {
                tracing::warn!(note_id = %located.meta.id, error = %e, "content could not be decrypted");
                Ok(DECRYPTION_FAILED_PLACEHOLDER.to_string())
            }
        }
    }

    /// Strict variant of [`read_content`](Self::read_content) for paths that must
    /// never re-persist a placeholder.
    pub fn read_content_strict(&self, located: &Located) -> Result<String> {
        let raw = RecordStore::read_raw(located)?;
        if !located.meta.encrypted || located.content_path.is_none() {
            return Ok(raw);
        }
        self.gate.decrypt(&raw)
    }

    /// Persist content in the representation `encrypted` calls for.
    pub fn write_content(&self, path: &Path, plaintext: &str, encrypted: bool) -> Result<()> {
        if encrypted {
            let token = self.gate.encrypt(plaintext)?;
            atomic::write_atomic_str(path, &token)
        } else {
            atomic::write_atomic_str(path, plaintext)
        }
    }

    pub fn load_note(&self, located: &Located) -> Result<Note> {
        Ok(Note {
            content: self.read_content(located)?,
            meta: located.meta.clone(),
        })
    }

    /// Write metadata at its current location and mirror it into the index.
    pub fn commit_meta(&self, located: &Located) -> Result<()> {
        RecordStore::save_meta(&located.meta_path, &located.meta)?;
        self.index.upsert(&self.records, &located.meta)
    }

    /// Look up an existing, non-trashed note or fail with `NotFound`/`Deleted`.
    pub fn find_active(&self, id: &str) -> Result<Located> {
        self.records.find_active(id)
    }

    pub fn find_required(&self, id: &str) -> Result<Located> {
        self.records.find_required(id)
    }
}
