//! Date-keyed diary entries.
//!
//! A journal entry is an ordinary note living in the Journal area with subject
//! `Journal` and a title of the form `YYYY-MM-DD Weekday`. The title is what
//! makes an entry findable by date, so it is matched literally.

use super::create::{create_locked, NewNote};
use crate::crypto::PassphraseSource;
use crate::error::{NoteError, Result};
use crate::model::{Area, NoteFormat, NoteMeta, JOURNAL_SUBJECT};
use crate::store::NoteStore;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub meta: NoteMeta,
    /// `false` when an entry for that date already existed.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalDay {
    pub date: String,
    pub title: String,
    pub content: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalDigest {
    /// `YYYY` or `YYYY-MM`.
    pub period: String,
    pub entries: Vec<JournalDay>,
}

/// Open the entry for `date` (`YYYY-MM-DD`), creating it if needed.
pub fn today<P: PassphraseSource>(store: &NoteStore<P>, date: &str) -> Result<JournalEntry> {
    let date = date.trim();
    if date.is_empty() {
        return Err(NoteError::InvalidInput("Missing date".to_string()));
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        NoteError::InvalidInput("Invalid date format (expected YYYY-MM-DD)".to_string())
    })?;
    let title = format!("{} {}", date, day.format("%A"));

    store.ensure_ready()?;
    let _lock = store.lock_notes()?;
    let existing = store
        .records()
        .scan_area(Area::Journal)?
        .into_iter()
        .find(|found| found.meta.title == title && !found.meta.deleted);
    if let Some(found) = existing {
        return Ok(JournalEntry {
            meta: found.meta,
            created: false,
        });
    }

    let meta = create_locked(
        store,
        NewNote {
            area: Some(Area::Journal),
            format: NoteFormat::Markdown,
            content: format!("# {}\n\n", title),
            title,
            subject: JOURNAL_SUBJECT.to_string(),
        },
    )?;
    tracing::info!(event = "journal_created", note_id = %meta.id, title = %meta.title, "journal note created");
    Ok(JournalEntry {
        meta,
        created: true,
    })
}

/// All journal entries for a year, or one month of it, oldest first.
pub fn aggregate<P: PassphraseSource>(
    store: &NoteStore<P>,
    year: &str,
    month: Option<&str>,
) -> Result<JournalDigest> {
    let year = year.trim();
    if year.is_empty() {
        return Err(NoteError::InvalidInput("Missing year parameter".to_string()));
    }
    let month = month
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(normalize_month);

    store.ensure_ready()?;
    let mut entries = Vec::new();
    for found in store.records().scan_area(Area::Journal)? {
        if found.meta.deleted {
            continue;
        }
        let Some((y, m, d)) = journal_date(&found.meta.title) else {
            continue;
        };
        if y != year || month.as_deref().is_some_and(|want| want != m) {
            continue;
        }
        entries.push(JournalDay {
            date: format!("{}-{}-{}", y, m, d),
            title: found.meta.title.clone(),
            content: store.read_content(&found)?,
            id: found.meta.id.clone(),
        });
    }
    entries.sort_by(|a, b| a.date.cmp(&b.date));

    let period = match &month {
        Some(m) => format!("{}-{}", year, m),
        None => year.to_string(),
    };
    Ok(JournalDigest { period, entries })
}

/// `"3"` and `"03"` select the same month.
fn normalize_month(raw: &str) -> String {
    match raw.parse::<u32>() {
        Ok(n) if (1..=12).contains(&n) => format!("{:02}", n),
        _ => raw.to_string(),
    }
}

/// Split a `YYYY-MM-DD <word>...` title into its date parts.
fn journal_date(title: &str) -> Option<(&str, &str, &str)> {
    let bytes = title.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !(digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10)) {
        return None;
    }
    let rest = &title[10..];
    let word = rest.trim_start();
    if word.len() == rest.len() {
        return None;
    }
    if !word
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    Some((&title[0..4], &title[5..7], &title[8..10]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::commands::{delete, get, save};

    #[test]
    fn test_today_creates_then_reuses() {
        let fx = fixture();
        let first = today(&fx.store, "2024-05-01").unwrap();
        assert!(first.created);
        assert_eq!(first.meta.title, "2024-05-01 Wednesday");
        assert_eq!(first.meta.subject, "Journal");
        assert!(first.meta.filename.ends_with("_2024-05-01-Wednesday.md"));
        assert_eq!(
            get::run(&fx.store, &first.meta.id).unwrap().content,
            "# 2024-05-01 Wednesday\n\n"
        );

        let again = today(&fx.store, " 2024-05-01 ").unwrap();
        assert!(!again.created);
        assert_eq!(again.meta.id, first.meta.id);
    }

    #[test]
    fn test_today_after_delete_creates_new() {
        let fx = fixture();
        let first = today(&fx.store, "2024-05-01").unwrap();
        delete::run(&fx.store, &first.meta.id).unwrap();
        let second = today(&fx.store, "2024-05-01").unwrap();
        assert!(second.created);
        assert_ne!(second.meta.id, first.meta.id);
    }

    #[test]
    fn test_today_rejects_bad_dates() {
        let fx = fixture();
        for bad in ["", "yesterday", "2024-13-01", "01.05.2024"] {
            assert!(matches!(today(&fx.store, bad), Err(NoteError::InvalidInput(_))), "{bad}");
        }
    }

    #[test]
    fn test_aggregate_filters_and_sorts() {
        let fx = fixture();
        let may2 = today(&fx.store, "2024-05-02").unwrap();
        let may1 = today(&fx.store, "2024-05-01").unwrap();
        today(&fx.store, "2024-06-01").unwrap();
        today(&fx.store, "2023-05-01").unwrap();
        save::run(&fx.store, &may2.meta.id, "second day", None).unwrap();

        let digest = aggregate(&fx.store, "2024", Some("5")).unwrap();
        assert_eq!(digest.period, "2024-05");
        let dates: Vec<_> = digest.entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-02"]);
        assert_eq!(digest.entries[0].id, may1.meta.id);
        assert_eq!(digest.entries[1].content, "second day");

        let year = aggregate(&fx.store, "2024", None).unwrap();
        assert_eq!(year.period, "2024");
        assert_eq!(year.entries.len(), 3);

        assert!(matches!(
            aggregate(&fx.store, " ", None),
            Err(NoteError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_journal_date_parsing() {
        assert_eq!(journal_date("2024-05-01 Wednesday"), Some(("2024", "05", "01")));
        assert_eq!(journal_date("2024-05-01  x"), Some(("2024", "05", "01")));
        assert_eq!(journal_date("2024-05-01"), None);
        assert_eq!(journal_date("2024-05-01Wednesday"), None);
        assert_eq!(journal_date("2024-05-01 -"), None);
        assert_eq!(journal_date("24-05-01 Wed"), None);
    }
}
