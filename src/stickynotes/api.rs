//! # API Facade
//!
//! [`NotesApi`] is the single entry point for collaborators: an HTTP layer, the
//! bundled CLI, a sync worker. It is a **thin facade** over the command layer.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Normalizes inputs** (trims ids and search queries)
//! - **Returns structured types**, never strings meant for a terminal
//!
//! Business logic lives in `commands/*.rs`; storage behavior in `store/`.
//!
//! ## Sharing
//!
//! Every method takes `&self` and `NotesApi` is `Send + Sync`, so one instance
//! can serve a pool of worker threads. Coordination between threads and between
//! processes happens through lock files in the data directory, not through
//! in-memory state. The only thing cached is the derived encryption key.

use crate::commands::encryption::{DisableReport, EncryptionStatus};
use crate::commands::export::{ExportEntry, ExportSelection};
use crate::commands::import::{ImportFile, ImportReport};
use crate::commands::journal::{JournalDigest, JournalEntry};
use crate::commands::list::ListQuery;
use crate::commands::save::SaveOutcome;
use crate::commands::sync::{SyncCheck, SyncSettings};
use crate::commands::{self, Transition};
use crate::config::StoreConfig;
use crate::crypto::{PassphraseSource, SettingsFile};
use crate::error::{NoteError, Result};
use crate::model::{MetaPatch, Note, NoteFormat, NoteMeta, PdfMeta, SortKey};
use crate::store::NoteStore;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// The main API facade for note operations.
pub struct NotesApi<P: PassphraseSource = SettingsFile> {
    store: NoteStore<P>,
}

impl NotesApi<SettingsFile> {
    /// Open the store described by `config`, with the passphrase kept in
    /// `<config_dir>/encryption.json`.
    pub fn open(config: &StoreConfig) -> Self {
        Self::new(NoteStore::open(config.layout(), config.kdf()))
    }
}

impl<P: PassphraseSource> NotesApi<P> {
    pub fn new(store: NoteStore<P>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NoteStore<P> {
        &self.store
    }

    pub fn create_note(&self, format: NoteFormat, title: Option<&str>) -> Result<Note> {
        commands::create::run(&self.store, format, title.map(str::trim))
    }

    pub fn get_note(&self, id: &str) -> Result<Note> {
        commands::get::run(&self.store, normalize_id(id)?)
    }

    pub fn save_content(&self, id: &str, text: &str, base_rev: Option<u64>) -> Result<SaveOutcome> {
        commands::save::run(&self.store, normalize_id(id)?, text, base_rev)
    }

    pub fn update_meta(&self, id: &str, patch: &MetaPatch) -> Result<NoteMeta> {
        commands::update::run(&self.store, normalize_id(id)?, patch)
    }

    pub fn delete_note(&self, id: &str) -> Result<Transition> {
        commands::delete::run(&self.store, normalize_id(id)?)
    }

    pub fn restore_note(&self, id: &str) -> Result<Transition> {
        commands::restore::run(&self.store, normalize_id(id)?)
    }

    pub fn list_notes(
        &self,
        include_deleted: bool,
        sort: SortKey,
        query: Option<&str>,
    ) -> Result<Vec<NoteMeta>> {
        let query = ListQuery {
            include_deleted,
            sort,
            query: query
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        };
        commands::list::run(&self.store, &query)
    }

    pub fn rebuild_index(&self) -> Result<usize> {
        commands::rebuild::run(&self.store)
    }

    /// Returns `true` when an existing key was replaced.
    pub fn set_encryption(&self, passphrase: &str, current: Option<&str>) -> Result<bool> {
        commands::encryption::set(&self.store, passphrase, current)
    }

    pub fn disable_encryption(&self, current: &str) -> Result<DisableReport> {
        commands::encryption::disable(&self.store, current)
    }

    pub fn toggle_note_encryption(&self, id: &str, want: bool) -> Result<NoteMeta> {
        commands::encryption::toggle(&self.store, normalize_id(id)?, want)
    }

    pub fn encryption_status(&self) -> Result<EncryptionStatus> {
        commands::encryption::status(&self.store)
    }

    pub fn get_pdf_settings(&self, id: &str) -> Result<PdfMeta> {
        commands::pdf_settings::get(&self.store, normalize_id(id)?)
    }

    pub fn set_pdf_settings(&self, id: &str, pdf: &PdfMeta) -> Result<NoteMeta> {
        commands::pdf_settings::set(&self.store, normalize_id(id)?, pdf)
    }

    pub fn import_files(&self, files: Vec<ImportFile>) -> Result<ImportReport> {
        commands::import::run(&self.store, files)
    }

    pub fn journal_today(&self, date: &str) -> Result<JournalEntry> {
        commands::journal::today(&self.store, date)
    }

    pub fn journal_aggregate(&self, year: &str, month: Option<&str>) -> Result<JournalDigest> {
        commands::journal::aggregate(&self.store, year, month)
    }

    pub fn export_entries(&self, selection: &ExportSelection) -> Result<Vec<ExportEntry>> {
        commands::export::entries(&self.store, selection)
    }

    pub fn download_name(&self, meta: &NoteMeta) -> String {
        commands::export::download_name(meta)
    }

    pub fn sync_settings(&self) -> SyncSettings {
        commands::sync::settings(&self.store)
    }

    pub fn save_sync_settings(&self, settings: &SyncSettings) -> Result<SyncSettings> {
        commands::sync::save(&self.store, settings)
    }

    pub fn request_sync_run(&self) -> Result<DateTime<Utc>> {
        commands::sync::request_run(&self.store)
    }

    pub fn set_sync_paused(&self, paused: bool) -> Result<bool> {
        commands::sync::set_paused(&self.store, paused)
    }

    pub fn sync_status(&self) -> Value {
        commands::sync::status(&self.store)
    }

    pub fn validate_sync_settings(&self, candidate: Option<&SyncSettings>) -> SyncCheck {
        commands::sync::validate(&self.store, candidate)
    }
}

/// Ids are opaque tokens; only surrounding whitespace is dropped.
fn normalize_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(NoteError::InvalidInput("Missing note id".to_string()));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MemPassphrase;
    use crate::test_utils::TestEnv;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_api_is_shareable() {
        assert_send_sync::<NotesApi<MemPassphrase>>();
        assert_send_sync::<NotesApi<SettingsFile>>();
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("  ab12cd34 ").unwrap(), "ab12cd34");
        assert!(matches!(normalize_id("   "), Err(NoteError::InvalidInput(_))));
    }

    #[test]
    fn test_ids_are_trimmed_before_dispatch() {
        let env = TestEnv::new();
        let note = env.api.create_note(NoteFormat::Markdown, Some("  Padded ")).unwrap();
        assert_eq!(note.meta.title, "Padded");

        let padded = format!(" {} ", note.meta.id);
        let saved = env.api.save_content(&padded, "body", Some(1)).unwrap();
        assert_eq!(saved.base_rev, Some(1));
        assert_eq!(env.api.get_note(&padded).unwrap().content, "body");
    }

    #[test]
    fn test_blank_query_lists_everything() {
        let env = TestEnv::new();
        env.api.create_note(NoteFormat::Markdown, Some("One")).unwrap();
        env.api.create_note(NoteFormat::Text, Some("Two")).unwrap();
        let all = env.api.list_notes(false, SortKey::Updated, Some("  ")).unwrap();
        assert_eq!(all.len(), 2);
        let one = env.api.list_notes(false, SortKey::Updated, Some("one")).unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_siblings_share_disk_and_key() {
        let env = TestEnv::with_passphrase(Some("pw"));
        let other = env.sibling();
        let note = env.api.create_note(NoteFormat::Markdown, None).unwrap();
        other.save_content(&note.meta.id, "from sibling", None).unwrap();
        other.toggle_note_encryption(&note.meta.id, true).unwrap();
        assert_eq!(env.api.get_note(&note.meta.id).unwrap().content, "from sibling");
    }

    #[test]
    fn test_sync_dispatch() {
        let env = TestEnv::new();
        assert_eq!(env.api.sync_status()["last_result"], "idle");
        assert!(matches!(env.api.validate_sync_settings(None), SyncCheck::Invalid(_)));
        env.api.set_sync_paused(true).unwrap();
        assert!(env.api.sync_settings().paused);
    }
}
