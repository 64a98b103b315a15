//! # Configuration
//!
//! Store configuration is a [`confique`] struct, layered in priority order:
//! 1. **Environment variables**: `DATA_DIR`, `CONFIG_DIR`, `STICKYNOTES_KDF_*`.
//! 2. **Config file**: `<config_dir>/stickynotes.toml`, optional.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | `data_dir` | `DATA_DIR` | `./data` |
//! | `config_dir` | `CONFIG_DIR` | `./config` |
//! | `kdf_memory_kib` | `STICKYNOTES_KDF_MEMORY_KIB` | `65536` |
//! | `kdf_iterations` | `STICKYNOTES_KDF_ITERATIONS` | `3` |
//! | `kdf_parallelism` | `STICKYNOTES_KDF_PARALLELISM` | `1` |

use crate::crypto::KdfParams;
use crate::error::{NoteError, Result};
use crate::store::layout::Layout;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "stickynotes.toml";
const DEFAULT_CONFIG_DIR: &str = "./config";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root of the notes, journal and trash areas and of `index.json`.
    #[config(env = "DATA_DIR", default = "./data")]
    pub data_dir: PathBuf,

    /// Holds `encryption.json` and `stickynotes.toml`.
    #[config(env = "CONFIG_DIR", default = "./config")]
    pub config_dir: PathBuf,

    /// Argon2id memory cost in KiB.
    #[config(env = "STICKYNOTES_KDF_MEMORY_KIB", default = 65536)]
    pub kdf_memory_kib: u32,

    #[config(env = "STICKYNOTES_KDF_ITERATIONS", default = 3)]
    pub kdf_iterations: u32,

    #[config(env = "STICKYNOTES_KDF_PARALLELISM", default = 1)]
    pub kdf_parallelism: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let kdf = KdfParams::default();
        Self {
            data_dir: PathBuf::from("./data"),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            kdf_memory_kib: kdf.memory_kib,
            kdf_iterations: kdf.iterations,
            kdf_parallelism: kdf.parallelism,
        }
    }
}

impl StoreConfig {
    /// Load from the environment, then `stickynotes.toml`, then defaults.
    ///
    /// The file is looked up in `config_dir` when given, else in `CONFIG_DIR`
    /// or `./config`. An explicit `config_dir` also wins over the loaded value.
    pub fn load(config_dir: Option<&Path>) -> Result<Self> {
        let dir = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::var_os("CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
        };
        let mut config = Self::builder()
            .env()
            .file(dir.join(CONFIG_FILE_NAME))
            .load()
            .map_err(invalid)?;
        if config_dir.is_some() {
            config.config_dir = dir;
        }
        Ok(config)
    }

    /// Load from a single file and defaults only, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::builder().file(path).load().map_err(invalid)
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.data_dir, &self.config_dir)
    }

    pub fn kdf(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.kdf_memory_kib,
            iterations: self.kdf_iterations,
            parallelism: self.kdf_parallelism,
        }
    }
}

fn invalid(e: confique::Error) -> NoteError {
    NoteError::InvalidInput(format!("invalid configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.kdf(), KdfParams::default());
        assert_eq!(
            config.layout().encryption_settings_path(),
            PathBuf::from("./config/encryption.json")
        );
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::from_file(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "data_dir = \"/srv/notes\"\nkdf_iterations = 5\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/notes"));
        assert_eq!(config.kdf().iterations, 5);
        assert_eq!(config.kdf().memory_kib, 65536);
    }

    #[test]
    fn test_bad_file_is_invalid_input() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "kdf_iterations = \"many\"\n").unwrap();
        assert!(matches!(
            StoreConfig::from_file(&path),
            Err(NoteError::InvalidInput(_))
        ));
    }
}
