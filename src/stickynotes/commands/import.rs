use super::create::{create_locked, NewNote};
use crate::crypto::PassphraseSource;
use crate::error::{NoteError, Result};
use crate::model::{normalize_citations, NoteFormat, NoteMeta};
use crate::store::NoteStore;
use serde::Serialize;
use std::path::Path;

/// One uploaded file: its client-side name and raw bytes.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub created: Vec<NoteMeta>,
    pub errors: Vec<ImportError>,
}

/// Create one Active note per file. A bad file is reported and skipped; it
/// never stops the rest of the batch.
pub fn run<P: PassphraseSource>(store: &NoteStore<P>, files: Vec<ImportFile>) -> Result<ImportReport> {
    if files.is_empty() {
        return Err(NoteError::InvalidInput("No files provided".to_string()));
    }
    store.ensure_ready()?;
    let _lock = store.lock_notes()?;

    let mut report = ImportReport::default();
    for file in files {
        match import_one(store, &file) {
            Ok(meta) => report.created.push(meta),
            Err((name, error)) => {
                tracing::warn!(file = %name, error = %error, "import skipped file");
                report.errors.push(ImportError { file: name, error });
            }
        }
    }

    tracing::info!(
        event = "import",
        count = report.created.len(),
        errors = report.errors.len(),
        "import completed"
    );
    Ok(report)
}

fn import_one<P: PassphraseSource>(
    store: &NoteStore<P>,
    file: &ImportFile,
) -> std::result::Result<NoteMeta, (String, String)> {
    let name = file.name.trim();
    if name.is_empty() {
        return Err((String::new(), "Missing filename".to_string()));
    }
    let path = Path::new(name);
    let safe_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let safe = Path::new(&safe_name);

    let Some(format) = safe
        .extension()
        .and_then(|e| e.to_str())
        .and_then(NoteFormat::from_extension)
    else {
        return Err((safe_name, "Unsupported file type".to_string()));
    };
    let title = safe
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = normalize_citations(&String::from_utf8_lossy(&file.bytes));

    create_locked(
        store,
        NewNote {
            format,
            title,
            content,
            ..NewNote::default()
        },
    )
    .map_err(|e| (safe_name, e.to_string()))
}

/// Read files from disk into [`ImportFile`]s. Unreadable paths are reported
/// as import errors rather than failing the batch.
pub fn read_paths(paths: &[impl AsRef<Path>]) -> (Vec<ImportFile>, Vec<ImportError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(bytes) => files.push(ImportFile { name, bytes }),
            Err(e) => errors.push(ImportError {
                file: name,
                error: format!("Failed to read file: {}", e),
            }),
        }
    }
    (files, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::get;
    use crate::commands::testing::fixture;
    use crate::model::Area;

    fn file(name: &str, text: &[u8]) -> ImportFile {
        ImportFile {
            name: name.to_string(),
            bytes: text.to_vec(),
        }
    }

    #[test]
    fn test_import_mixed_batch() {
        let fx = fixture();
        let report = run(
            &fx.store,
            vec![
                file("../../etc/Meeting Notes.MD", b"# hi \xe2\x80\x94 \xff"),
                file("config.yml", b"a: 1\n"),
                file("photo.png", b"\x89PNG"),
                file("   ", b""),
            ],
        )
        .unwrap();

        assert_eq!(report.created.len(), 2);
        assert_eq!(
            report.errors,
            vec![
                ImportError {
                    file: "photo.png".into(),
                    error: "Unsupported file type".into()
                },
                ImportError {
                    file: "".into(),
                    error: "Missing filename".into()
                },
            ]
        );

        let notes = &report.created;
        assert_eq!(notes[0].title, "Meeting Notes");
        assert!(notes[0].filename.ends_with("_Meeting-Notes.md"));
        let got = get::run(&fx.store, &notes[0].id).unwrap();
        assert_eq!(got.content, "# hi \u{2014} \u{fffd}");
        let found = fx.store.records().find(&notes[0].id).unwrap().unwrap();
        assert_eq!(found.area, Area::Active);

        assert!(notes[1].filename.ends_with(".yml"));
    }

    #[test]
    fn test_import_all_invalid_still_reports() {
        let fx = fixture();
        let report = run(&fx.store, vec![file("a.pdf", b"")]).unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_import_nothing() {
        let fx = fixture();
        assert!(matches!(run(&fx.store, vec![]), Err(NoteError::InvalidInput(_))));
    }
}
