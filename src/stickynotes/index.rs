//! # Index
//!
//! `index.json` is a denormalized copy of every note's metadata, so listing and
//! sorting never open individual files:
//!
//! ```json
//! { "version": 1, "notes": [ { "id": "1a2b3c4d", ... }, ... ] }
//! ```
//!
//! The index is a cache. The metadata files in the area directories are the
//! truth, and [`NoteIndex::rebuild`] regenerates the index from them at any time.
//! A missing or unparsable index is never an error: [`NoteIndex::load`] returns
//! `None` and callers rebuild.
//!
//! ## Locking
//!
//! Every read-modify-write of the index file happens under an exclusive
//! [`FileLock`] on `.index.lock`, so concurrent writers in any number of
//! processes cannot drop each other's updates. Record order inside the file
//! carries no meaning; listing order is computed by [`sort_records`].

use crate::error::Result;
use crate::model::{Area, NoteMeta, SortKey};
use crate::store::atomic::write_json;
use crate::store::layout::Layout;
use crate::store::lock::FileLock;
use crate::store::records::RecordStore;
use serde::{Deserialize, Serialize};
use std::fs;

pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct IndexFile<'a> {
    version: u32,
    notes: &'a [NoteMeta],
}

/// Accepted on-disk shapes: the current envelope or a legacy bare list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndexShape {
    Envelope { notes: Vec<NoteMeta> },
    Bare(Vec<NoteMeta>),
}

#[derive(Debug, Clone)]
pub struct NoteIndex {
    layout: Layout,
}

impl NoteIndex {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Current records, or `None` if the index is missing or not a valid index.
    pub fn load(&self) -> Option<Vec<NoteMeta>> {
        let path = self.layout.index_path();
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<IndexShape>(&text) {
            Ok(IndexShape::Envelope { notes }) | Ok(IndexShape::Bare(notes)) => Some(notes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "index unreadable, will rebuild");
                None
            }
        }
    }

    /// Regenerate the index from every metadata file in every area.
    pub fn rebuild(&self, records: &RecordStore) -> Result<Vec<NoteMeta>> {
        let _lock = FileLock::acquire(&self.layout.index_lock_path())?;
        self.rebuild_locked(records)
    }

    /// Replace the record with the same id, or append it.
    ///
    /// A missing or corrupt index is rebuilt from disk instead, which already
    /// includes `meta` as long as it has been saved first.
    pub fn upsert(&self, records: &RecordStore, meta: &NoteMeta) -> Result<()> {
        if meta.id.is_empty() {
            return Ok(());
        }
        let _lock = FileLock::acquire(&self.layout.index_lock_path())?;
        let Some(mut notes) = self.load() else {
            self.rebuild_locked(records)?;
            return Ok(());
        };
        match notes.iter_mut().find(|m| m.id == meta.id) {
            Some(slot) => *slot = meta.clone(),
            None => notes.push(meta.clone()),
        }
        self.save(&notes)
    }

    /// Records from the index, rebuilding first if necessary.
    pub fn list(&self, records: &RecordStore, include_deleted: bool) -> Result<Vec<NoteMeta>> {
        let notes = match self.load() {
            Some(notes) => notes,
            None => self.rebuild(records)?,
        };
        if include_deleted {
            return Ok(notes);
        }
        Ok(notes.into_iter().filter(|m| !m.deleted).collect())
    }

    fn rebuild_locked(&self, records: &RecordStore) -> Result<Vec<NoteMeta>> {
        let mut notes = Vec::new();
        for area in Area::ALL {
            notes.extend(records.scan_area(area)?.into_iter().map(|found| found.meta));
        }
        self.save(&notes)?;
        tracing::info!(event = "index_rebuilt", count = notes.len(), "index rebuilt");
        Ok(notes)
    }

    fn save(&self, notes: &[NoteMeta]) -> Result<()> {
        write_json(
            &self.layout.index_path(),
            &IndexFile {
                version: INDEX_VERSION,
                notes,
            },
        )
    }
}

/// Order records for display: by `key`, then pinned notes first.
///
/// Both passes are stable, so pinned and unpinned notes each keep the primary order.
pub fn sort_records(mut notes: Vec<NoteMeta>, key: SortKey) -> Vec<NoteMeta> {
    match key {
        SortKey::Updated => notes.sort_by(|a, b| b.updated.cmp(&a.updated)),
        SortKey::Created => notes.sort_by(|a, b| b.created.cmp(&a.created)),
        SortKey::Filename => notes.sort_by(|a, b| a.filename.cmp(&b.filename)),
    }
    notes.sort_by_key(|m| !m.pinned);
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now_utc;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RecordStore, NoteIndex) {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path().join("data"), tmp.path().join("config"));
        layout.ensure_dirs().unwrap();
        (tmp, RecordStore::new(layout.clone()), NoteIndex::new(layout))
    }

    fn put(records: &RecordStore, area: Area, id: &str) -> NoteMeta {
        let basename = format!("2024-01-01_00-00-00_{}", id);
        let meta = NoteMeta::new(id.to_string(), format!("{}.md", basename), now_utc());
        let path = records
            .layout()
            .area_dir(area)
            .join(format!("{}.json", basename));
        RecordStore::save_meta(&path, &meta).unwrap();
        meta
    }

    fn meta_at(id: &str, minutes: i64, pinned: bool) -> NoteMeta {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        let mut meta = NoteMeta::new(id.to_string(), format!("{}.md", id), t);
        meta.pinned = pinned;
        meta
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let (_tmp, records, index) = setup();
        assert!(index.load().is_none());
        fs::write(records.layout().index_path(), "{ broken").unwrap();
        assert!(index.load().is_none());
        fs::write(records.layout().index_path(), r#"{"version":1,"notes":"nope"}"#).unwrap();
        assert!(index.load().is_none());
    }

    #[test]
    fn test_load_accepts_bare_list() {
        let (_tmp, records, index) = setup();
        fs::write(
            records.layout().index_path(),
            r#"[{"id":"00000001","filename":"a.md"}]"#,
        )
        .unwrap();
        let notes = index.load().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "00000001");
    }

    #[test]
    fn test_rebuild_tags_deleted_by_area_unless_stored() {
        let (_tmp, records, index) = setup();
        put(&records, Area::Active, "00000001");
        put(&records, Area::Journal, "00000002");

        // Trash entry without a stored flag: the area decides.
        let trash = records.layout().area_dir(Area::Trash);
        fs::write(
            trash.join("x_00000003.json"),
            r#"{"id":"00000003","filename":"x_00000003.md"}"#,
        )
        .unwrap();
        // Trash entry whose stored flag disagrees: the stored value wins.
        fs::write(
            trash.join("y_00000004.json"),
            r#"{"id":"00000004","filename":"y_00000004.md","deleted":false}"#,
        )
        .unwrap();

        let notes = index.rebuild(&records).unwrap();
        assert_eq!(notes.len(), 4);
        let deleted = |id: &str| notes.iter().find(|m| m.id == id).unwrap().deleted;
        assert!(!deleted("00000001"));
        assert!(!deleted("00000002"));
        assert!(deleted("00000003"));
        assert!(!deleted("00000004"));

        let on_disk: Value =
            serde_json::from_str(&fs::read_to_string(records.layout().index_path()).unwrap())
                .unwrap();
        assert_eq!(on_disk["version"], 1);
        assert_eq!(on_disk["notes"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_upsert_replaces_or_appends() {
        let (_tmp, records, index) = setup();
        let mut first = put(&records, Area::Active, "00000001");
        index.rebuild(&records).unwrap();

        first.title = "changed".into();
        index.upsert(&records, &first).unwrap();
        let second = meta_at("00000002", 0, false);
        index.upsert(&records, &second).unwrap();

        let notes = index.load().unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.iter().find(|m| m.id == "00000001").unwrap().title, "changed");
    }

    #[test]
    fn test_upsert_without_index_rebuilds() {
        let (_tmp, records, index) = setup();
        let meta = put(&records, Area::Active, "00000001");
        put(&records, Area::Active, "00000002");
        index.upsert(&records, &meta).unwrap();
        assert_eq!(index.load().unwrap().len(), 2);
    }

    #[test]
    fn test_list_filters_deleted() {
        let (_tmp, records, index) = setup();
        put(&records, Area::Active, "00000001");
        put(&records, Area::Trash, "00000002");
        // NoteMeta::new stores deleted=false, so mark the trashed one explicitly.
        let mut trashed = records.find("00000002").unwrap().unwrap();
        trashed.meta.deleted = true;
        RecordStore::save_meta(&trashed.meta_path, &trashed.meta).unwrap();

        assert_eq!(index.list(&records, false).unwrap().len(), 1);
        assert_eq!(index.list(&records, true).unwrap().len(), 2);
    }

    #[test]
    fn test_sort_pinned_first_preserving_primary_order() {
        let notes = vec![
            meta_at("a", 1, false),
            meta_at("b", 3, true),
            meta_at("c", 2, false),
            meta_at("d", 4, false),
            meta_at("e", 0, true),
        ];
        let ids = |v: Vec<NoteMeta>| v.into_iter().map(|m| m.id).collect::<Vec<_>>();

        assert_eq!(
            ids(sort_records(notes.clone(), SortKey::Updated)),
            vec!["b", "e", "d", "c", "a"]
        );
        assert_eq!(
            ids(sort_records(notes.clone(), SortKey::Created)),
            vec!["b", "e", "d", "c", "a"]
        );
        assert_eq!(
            ids(sort_records(notes, SortKey::Filename)),
            vec!["b", "e", "a", "c", "d"]
        );
    }
}
