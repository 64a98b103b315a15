use crate::api::NotesApi;
use crate::crypto::{KdfParams, MemPassphrase};
use crate::store::layout::Layout;
use crate::store::NoteStore;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    // Keeps the directory alive until the test is done.
    pub _temp_dir: TempDir,
    pub api: NotesApi<MemPassphrase>,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_passphrase(None)
    }

    /// An environment whose encryption key is already set.
    pub fn with_passphrase(passphrase: Option<&str>) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        let config_dir = temp_dir.path().join("config");
        let source = match passphrase {
            Some(p) => MemPassphrase::with_passphrase(p),
            None => MemPassphrase::new(),
        };
        let store = NoteStore::with_source(
            Layout::new(&data_dir, &config_dir),
            source,
            KdfParams::insecure_fast(),
        );
        Self {
            _temp_dir: temp_dir,
            api: NotesApi::new(store),
            data_dir,
            config_dir,
        }
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.data_dir, &self.config_dir)
    }

    /// A second handle on the same directories, as another worker would have.
    pub fn sibling(&self) -> NotesApi<MemPassphrase> {
        let source = self.api.store().gate().source().clone();
        NotesApi::new(NoteStore::with_source(
            self.layout(),
            source,
            KdfParams::insecure_fast(),
        ))
    }
}
