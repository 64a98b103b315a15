use crate::error::Result;
use crate::model::Area;
use std::fs;
use std::path::{Path, PathBuf};

/// Where everything lives on disk.
///
/// ```text
/// <data_dir>/
/// ├── notes/          # Active area
/// ├── journal/        # Journal area
/// ├── trash/          # Trash area
/// ├── exports/
/// ├── sync/           # settings.json, status.json, run_once
/// ├── index.json
/// ├── .index.lock
/// └── .notes.lock
/// <config_dir>/
/// ├── encryption.json
/// └── pdf_settings.json   # legacy, migrated into per-note metadata
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    data_dir: PathBuf,
    config_dir: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            config_dir: config_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn area_dir(&self, area: Area) -> PathBuf {
        self.data_dir.join(area.dir_name())
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn sync_dir(&self) -> PathBuf {
        self.data_dir.join("sync")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.json")
    }

    pub fn index_lock_path(&self) -> PathBuf {
        self.data_dir.join(".index.lock")
    }

    pub fn notes_lock_path(&self) -> PathBuf {
        self.data_dir.join(".notes.lock")
    }

    pub fn encryption_settings_path(&self) -> PathBuf {
        self.config_dir.join("encryption.json")
    }

    pub fn legacy_pdf_settings_path(&self) -> PathBuf {
        self.config_dir.join("pdf_settings.json")
    }

    /// Create the area and export directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for area in Area::ALL {
            fs::create_dir_all(self.area_dir(area))?;
        }
        fs::create_dir_all(self.exports_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/data", "/config");
        assert_eq!(layout.area_dir(Area::Active), PathBuf::from("/data/notes"));
        assert_eq!(layout.area_dir(Area::Trash), PathBuf::from("/data/trash"));
        assert_eq!(layout.index_path(), PathBuf::from("/data/index.json"));
        assert_eq!(
            layout.encryption_settings_path(),
            PathBuf::from("/config/encryption.json")
        );
    }

    #[test]
    fn test_ensure_dirs() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path().join("data"), tmp.path().join("config"));
        layout.ensure_dirs().unwrap();
        for area in Area::ALL {
            assert!(layout.area_dir(area).is_dir());
        }
        assert!(layout.exports_dir().is_dir());
    }
}
