use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::{now_utc, Area, Note, NoteFormat, NoteMeta};
use crate::store::alloc::allocate;
use crate::store::records::RecordStore;
use crate::store::NoteStore;

/// Everything needed to lay down a brand-new note.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub area: Option<Area>,
    pub format: NoteFormat,
    /// Used for the basename slug and as the display title.
    pub title: String,
    pub subject: String,
    pub content: String,
}

pub fn run<P: PassphraseSource>(
    store: &NoteStore<P>,
    format: NoteFormat,
    title: Option<&str>,
) -> Result<Note> {
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let meta = create_locked(
        store,
        NewNote {
            format,
            title: title.unwrap_or_default().to_string(),
            ..NewNote::default()
        },
    )?;
    Ok(Note {
        meta,
        content: String::new(),
    })
}

/// Allocate, write content, write metadata, upsert. Caller holds the notes lock.
///
/// New notes always start as plaintext.
pub(crate) fn create_locked<P: PassphraseSource>(
    store: &NoteStore<P>,
    new: NewNote,
) -> Result<NoteMeta> {
    let area = new.area.unwrap_or(Area::Active);
    let records = store.records();
    let created = now_utc();
    let title = new.title.trim();

    let allocation = allocate(title, created, |candidate| {
        if records.basename_taken(area, &candidate.basename, new.format) {
            return true;
        }
        match records.id_in_use(&candidate.id) {
            Ok(in_use) => in_use,
            Err(e) => {
                tracing::warn!(error = %e, "could not check id uniqueness, retrying");
                true
            }
        }
    })?;

    let dir = store.layout().area_dir(area);
    let content_path = dir.join(format!(
        "{}.{}",
        allocation.basename,
        new.format.extension()
    ));
    let meta_path = dir.join(format!("{}.json", allocation.basename));

    store.write_content(&content_path, &new.content, false)?;

    let filename = format!("{}.{}", allocation.basename, new.format.extension());
    let mut meta = NoteMeta::new(allocation.id, filename, created);
    meta.title = title.to_string();
    meta.subject = new.subject.trim().to_string();

    RecordStore::save_meta(&meta_path, &meta)?;
    store.index().upsert(records, &meta)?;

    tracing::info!(
        event = "note_created",
        note_id = %meta.id,
        filename = %meta.filename,
        area = %area,
        "note created"
    );
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use std::fs;

    #[test]
    fn test_create_writes_pair_and_index() {
        let fx = fixture();
        let note = run(&fx.store, NoteFormat::Markdown, None).unwrap();

        assert_eq!(note.meta.rev, 1);
        assert_eq!(note.meta.id.len(), 8);
        assert!(note.meta.filename.ends_with(&format!("_{}.md", note.meta.id)));
        assert!(!note.meta.deleted && !note.meta.encrypted && !note.meta.pinned);

        let dir = fx.store.layout().area_dir(Area::Active);
        assert_eq!(fs::read_to_string(dir.join(&note.meta.filename)).unwrap(), "");
        let found = fx.store.records().find(&note.meta.id).unwrap().unwrap();
        assert_eq!(found.meta, note.meta);

        let indexed = fx.store.index().load().unwrap();
        assert_eq!(indexed, vec![note.meta]);
    }

    #[test]
    fn test_create_with_title_slugs_basename() {
        let fx = fixture();
        let note = run(&fx.store, NoteFormat::Text, Some("Täst Note")).unwrap();
        assert!(note.meta.filename.ends_with("_Taest-Note.txt"));
        assert_eq!(note.meta.title, "Täst Note");
        assert_eq!(note.meta.rev, 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let fx = fixture();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..25 {
            let note = run(&fx.store, NoteFormat::Markdown, Some("same")).unwrap();
            assert!(ids.insert(note.meta.id));
        }
    }

    #[test]
    fn test_create_in_journal_area() {
        let fx = fixture();
        fx.store.ensure_ready().unwrap();
        let _lock = fx.store.lock_notes().unwrap();
        let meta = create_locked(
            &fx.store,
            NewNote {
                area: Some(Area::Journal),
                title: "2024-05-01 Wednesday".into(),
                subject: "Journal".into(),
                content: "# hi\n".into(),
                ..NewNote::default()
            },
        )
        .unwrap();
        let found = fx.store.records().find(&meta.id).unwrap().unwrap();
        assert_eq!(found.area, Area::Journal);
        assert_eq!(RecordStore::read_raw(&found).unwrap(), "# hi\n");
    }
}
