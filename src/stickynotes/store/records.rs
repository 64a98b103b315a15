use super::atomic::write_json;
use super::layout::Layout;
use crate::error::{NoteError, Result};
use crate::model::{Area, NoteFormat, NoteMeta};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// A note found on disk: where its files are and what its metadata says.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub area: Area,
    pub meta_path: PathBuf,
    /// Existing content file next to the metadata, if any.
    pub content_path: Option<PathBuf>,
    pub meta: NoteMeta,
}

impl Located {
    pub fn in_trash(&self) -> bool {
        self.area == Area::Trash
    }

    /// Where content should be written: the existing file, or `filename` next to
    /// the metadata when the content file has gone missing.
    pub fn content_target(&self) -> Result<PathBuf> {
        if let Some(path) = &self.content_path {
            return Ok(path.clone());
        }
        if self.meta.filename.is_empty() {
            return Err(NoteError::Store(format!(
                "corrupt note {} (missing filename)",
                self.meta.id
            )));
        }
        let dir = self.meta_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(&self.meta.filename))
    }
}

/// File-level access to metadata/content pairs across the three areas.
///
/// This is the source of truth. It knows nothing about the index or encryption;
/// callers layer those on top.
#[derive(Debug, Clone)]
pub struct RecordStore {
    layout: Layout,
}

impl RecordStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Load metadata found in `area`. A file without a stored `deleted` flag
    /// takes the one the area implies.
    pub fn load_meta_in(path: &Path, area: Area) -> Result<NoteMeta> {
        let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        let stored_deleted = value.get("deleted").and_then(Value::as_bool);
        let mut meta: NoteMeta = serde_json::from_value(value)?;
        meta.deleted = stored_deleted.unwrap_or_else(|| area.implies_deleted());
        Ok(meta)
    }

    pub fn save_meta(path: &Path, meta: &NoteMeta) -> Result<()> {
        write_json(path, meta)
    }

    /// First existing content file for a metadata path, in `md, txt, yaml, yml` order.
    pub fn content_path_for(meta_path: &Path) -> Option<PathBuf> {
        NoteFormat::ALL
            .iter()
            .map(|format| meta_path.with_extension(format.extension()))
            .find(|candidate| candidate.is_file())
    }

    /// Metadata file paths in an area, sorted. A missing directory is empty.
    pub fn meta_paths(&self, area: Area) -> Result<Vec<PathBuf>> {
        let dir = self.layout.area_dir(area);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if is_json && !hidden && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every readable metadata file in an area. Unreadable files are skipped.
    pub fn scan_area(&self, area: Area) -> Result<Vec<Located>> {
        let mut found = Vec::new();
        for meta_path in self.meta_paths(area)? {
            match Self::load_meta_in(&meta_path, area) {
                Ok(meta) => found.push(Located {
                    area,
                    content_path: Self::content_path_for(&meta_path),
                    meta_path,
                    meta,
                }),
                Err(e) => {
                    tracing::warn!(path = %meta_path.display(), error = %e, "skipping unreadable note metadata");
                }
            }
        }
        Ok(found)
    }

    /// Linear scan of Active, Journal, then Trash for a note id.
    pub fn find(&self, id: &str) -> Result<Option<Located>> {
        if id.is_empty() {
            return Ok(None);
        }
        for area in Area::ALL {
            for meta_path in self.meta_paths(area)? {
                let Ok(meta) = Self::load_meta_in(&meta_path, area) else {
                    continue;
                };
                if meta.id == id {
                    return Ok(Some(Located {
                        area,
                        content_path: Self::content_path_for(&meta_path),
                        meta_path,
                        meta,
                    }));
                }
            }
        }
        Ok(None)
    }

    pub fn find_required(&self, id: &str) -> Result<Located> {
        self.find(id)?
            .ok_or_else(|| NoteError::NotFound(id.to_string()))
    }

    /// Like [`find_required`](Self::find_required), but rejects trashed notes.
    pub fn find_active(&self, id: &str) -> Result<Located> {
        let located = self.find_required(id)?;
        if located.in_trash() {
            return Err(NoteError::Deleted(id.to_string()));
        }
        Ok(located)
    }

    /// Raw stored content (plaintext or token); empty when there is no content file.
    pub fn read_raw(located: &Located) -> Result<String> {
        match &located.content_path {
            Some(path) => {
                let bytes = fs::read(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            None => Ok(String::new()),
        }
    }

    pub fn basename_taken(&self, area: Area, basename: &str, format: NoteFormat) -> bool {
        let dir = self.layout.area_dir(area);
        dir.join(format!("{}.{}", basename, format.extension())).exists()
            || dir.join(format!("{}.json", basename)).exists()
    }

    /// Whether any file in any area already carries this id segment.
    pub fn id_in_use(&self, id: &str) -> Result<bool> {
        let needle = format!("_{}", id);
        for area in Area::ALL {
            let dir = self.layout.area_dir(area);
            if !dir.exists() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let name = entry?.file_name();
                if name.to_string_lossy().contains(&needle) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Move both files into another area, keeping their names.
    ///
    /// Content moves first, then metadata. Both targets are checked before
    /// anything moves. The pair is not moved transactionally: a crash between
    /// the two renames leaves the note split, and a later lookup finds the
    /// metadata without its content.
    pub fn move_to(&self, located: &Located, target: Area) -> Result<Located> {
        if located.area == target {
            return Ok(located.clone());
        }
        let dir = self.layout.area_dir(target);
        fs::create_dir_all(&dir)?;

        let meta_name = file_name(&located.meta_path)?;
        let target_meta = dir.join(meta_name);
        let target_content = match &located.content_path {
            Some(path) => Some(dir.join(file_name(path)?)),
            None => None,
        };

        if target_meta.exists() || target_content.as_ref().is_some_and(|p| p.exists()) {
            return Err(NoteError::Conflict(format!(
                "{} already exists in {}",
                meta_name, target
            )));
        }

        if let (Some(from), Some(to)) = (&located.content_path, &target_content) {
            fs::rename(from, to)?;
        }
        fs::rename(&located.meta_path, &target_meta)?;

        Ok(Located {
            area: target,
            meta_path: target_meta,
            content_path: target_content,
            meta: located.meta.clone(),
        })
    }

    /// Rename both files to `new_basename` within their area.
    ///
    /// Fails with `Conflict` before touching anything if either target already
    /// exists and is not this note's own file. `meta.filename` is updated on the
    /// returned value; persisting it is up to the caller.
    pub fn rename(&self, located: &Located, new_basename: &str) -> Result<Located> {
        let dir = located
            .meta_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.layout.area_dir(located.area));
        let ext = located
            .meta
            .format()
            .map(|f| f.extension().to_string())
            .or_else(|| {
                Path::new(&located.meta.filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| NoteFormat::Markdown.extension().to_string());

        let new_content = dir.join(format!("{}.{}", new_basename, ext));
        let new_meta = dir.join(format!("{}.json", new_basename));

        let content_clash =
            new_content.exists() && located.content_path.as_deref() != Some(new_content.as_path());
        let meta_clash = new_meta.exists() && new_meta != located.meta_path;
        if content_clash || meta_clash {
            return Err(NoteError::Conflict(new_basename.to_string()));
        }

        if let Some(from) = &located.content_path {
            fs::rename(from, &new_content)?;
        }
        fs::rename(&located.meta_path, &new_meta)?;

        let mut meta = located.meta.clone();
        meta.filename = file_name(&new_content)?.to_string();
        Ok(Located {
            area: located.area,
            content_path: located.content_path.as_ref().map(|_| new_content),
            meta_path: new_meta,
            meta,
        })
    }
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NoteError::Store(format!("invalid file name: {}", path.display())))
}
