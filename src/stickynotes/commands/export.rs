use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::model::{Area, NoteMeta};
use crate::store::alloc::{sanitize, transliterate};
use crate::store::records::{Located, RecordStore};
use crate::store::NoteStore;
use serde::Serialize;

const MAX_DOWNLOAD_STEM: usize = 80;

/// Which notes to hand to an archive writer.
#[derive(Debug, Clone)]
pub enum ExportSelection {
    All { include_deleted: bool },
    Ids(Vec<String>),
}

/// One note ready for packaging: its area folder, metadata and content with
/// encryption removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEntry {
    pub folder: String,
    pub meta: NoteMeta,
    /// Content file name next to the metadata, if the note has one.
    pub content_name: Option<String>,
    pub content: Option<String>,
}

/// Collect notes for export. Encrypted content is decrypted; if that fails the
/// stored ciphertext is exported as-is. Unknown ids are skipped.
pub fn entries<P: PassphraseSource>(
    store: &NoteStore<P>,
    selection: &ExportSelection,
) -> Result<Vec<ExportEntry>> {
    store.ensure_ready()?;
    let mut out = Vec::new();
    match selection {
        ExportSelection::All { include_deleted } => {
            for area in Area::ALL {
                if area == Area::Trash && !include_deleted {
                    continue;
                }
                for found in store.records().scan_area(area)? {
                    out.push(entry(store, found)?);
                }
            }
        }
        ExportSelection::Ids(ids) => {
            for id in ids {
                if let Some(found) = store.records().find(id)? {
                    out.push(entry(store, found)?);
                }
            }
        }
    }
    tracing::info!(event = "export", count = out.len(), "export entries collected");
    Ok(out)
}

fn entry<P: PassphraseSource>(store: &NoteStore<P>, found: Located) -> Result<ExportEntry> {
    let content_name = found
        .content_path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());
    let content = match &found.content_path {
        None => None,
        Some(_) => Some(match store.read_content_strict(&found) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(note_id = %found.meta.id, error = %e, "exporting stored ciphertext");
                RecordStore::read_raw(&found)?
            }
        }),
    };
    Ok(ExportEntry {
        folder: found.area.dir_name().to_string(),
        meta: found.meta,
        content_name,
        content,
    })
}

/// File name offered when a single note is downloaded as Markdown.
pub fn download_name(meta: &NoteMeta) -> String {
    let title = meta.title.trim();
    if !title.is_empty() {
        let safe: String = sanitize(&transliterate(title))
            .chars()
            .take(MAX_DOWNLOAD_STEM)
            .collect();
        let safe = if safe.is_empty() { "note".to_string() } else { safe };
        return format!("{}.md", safe);
    }
    let name = if meta.filename.is_empty() {
        format!("{}.md", meta.id)
    } else {
        meta.filename.clone()
    };
    if name.ends_with(".md") {
        return name;
    }
    match name.rsplit_once('.') {
        Some((stem, _)) => format!("{}.md", stem),
        None => format!("{}.md", name),
    }
}
