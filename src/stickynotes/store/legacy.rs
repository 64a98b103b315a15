use super::atomic::write_json;
use super::records::RecordStore;
use crate::error::Result;
use crate::model::{Area, PdfMeta};
use serde_json::Value;
use std::fs;

/// Seed a `pdf` block into every Active or Journal note that lacks one, using
/// `author` and `version` from the old global `pdf_settings.json`.
///
/// Returns how many metadata files were rewritten. Revisions are not bumped.
/// A missing or unreadable legacy file migrates nothing.
pub fn migrate_pdf_settings(records: &RecordStore) -> Result<usize> {
    let legacy_path = records.layout().legacy_pdf_settings_path();
    let Ok(text) = fs::read_to_string(&legacy_path) else {
        return Ok(0);
    };
    let Ok(Value::Object(legacy)) = serde_json::from_str::<Value>(&text) else {
        return Ok(0);
    };

    let field = |key: &str| match legacy.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    };
    let seed = PdfMeta {
        author: field("author"),
        version: field("version"),
        ..PdfMeta::default()
    };
    let seed = serde_json::to_value(&seed)?;

    let mut migrated = 0;
    for area in [Area::Active, Area::Journal] {
        for path in records.meta_paths(area)? {
            let Ok(text) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(Value::Object(mut meta)) = serde_json::from_str::<Value>(&text) else {
                continue;
            };
            if meta.get("pdf").is_some_and(Value::is_object) {
                continue;
            }
            meta.insert("pdf".to_string(), seed.clone());
            write_json(&path, &Value::Object(meta))?;
            migrated += 1;
        }
    }
    if migrated > 0 {
        tracing::info!(event = "pdf_settings_migrated", count = migrated, "migrated legacy export settings");
    }
    Ok(migrated)
}
