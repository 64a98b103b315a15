//! Id and basename allocation.
//!
//! A basename is `<timestamp>_<id>` or `<timestamp>_<id>_<slug>`, where the
//! timestamp is the creation time (`%Y-%m-%d_%H-%M-%S`, UTC), the id is 8 random
//! hex characters and the slug is a filesystem-safe rendering of the user title.
//! The id and timestamp segments are permanent; a rename only swaps the slug.

use crate::error::{NoteError, Result};
use chrono::{DateTime, Utc};
use rand::RngCore;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const MAX_ALLOC_ATTEMPTS: usize = 20;
pub const MAX_SLUG_LEN: usize = 60;
const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A candidate produced by [`allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: String,
    pub basename: String,
}

/// 4 random bytes, hex encoded.
pub fn gen_id() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Expand umlauts and ligature-like letters, then strip combining marks.
pub fn transliterate(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ä' => expanded.push_str("ae"),
            'ö' => expanded.push_str("oe"),
            'ü' => expanded.push_str("ue"),
            'ß' => expanded.push_str("ss"),
            'Ä' => expanded.push_str("Ae"),
            'Ö' => expanded.push_str("Oe"),
            'Ü' => expanded.push_str("Ue"),
            other => expanded.push(other),
        }
    }
    expanded.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Replace every run of characters outside `[A-Za-z0-9._-]` with `-`,
/// then trim dashes at both ends.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out.trim_matches('-').to_string()
}

pub fn slugify_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return String::new();
    }
    let safe = sanitize(&transliterate(title));
    // sanitize only emits ASCII, so byte truncation is char-safe.
    safe[..safe.len().min(MAX_SLUG_LEN)].to_string()
}

pub fn format_stamp(created: DateTime<Utc>) -> String {
    created.format(STAMP_FORMAT).to_string()
}

fn join_basename(stamp: &str, id: &str, slug: &str) -> String {
    if slug.is_empty() {
        format!("{}_{}", stamp, id)
    } else {
        format!("{}_{}_{}", stamp, id, slug)
    }
}

pub fn make_basename(id: &str, user_title: &str, created: DateTime<Utc>) -> String {
    join_basename(&format_stamp(created), id, &slugify_title(user_title))
}

/// Basename for a user-title rename: keeps the timestamp segment that precedes
/// `_<id>` in the current filename. Falls back to the current time when the
/// filename does not carry one.
pub fn rename_basename(current_filename: &str, id: &str, new_title: &str) -> String {
    let marker = format!("_{}", id);
    let stamp = match current_filename.split_once(&marker) {
        Some((stamp, _)) if !id.is_empty() => stamp.to_string(),
        _ => format_stamp(Utc::now()),
    };
    join_basename(&stamp, id, &slugify_title(new_title))
}

/// Produce a fresh id and basename, retrying while `taken` reports a collision.
pub fn allocate<F>(user_title: &str, created: DateTime<Utc>, mut taken: F) -> Result<Allocation>
where
    F: FnMut(&Allocation) -> bool,
{
    for _ in 0..MAX_ALLOC_ATTEMPTS {
        let id = gen_id();
        let candidate = Allocation {
            basename: make_basename(&id, user_title, created),
            id,
        };
        if !taken(&candidate) {
            return Ok(candidate);
        }
    }
    Err(NoteError::AllocationExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_umlauts_are_expanded() {
        assert_eq!(slugify_title("Täst Note"), "Taest-Note");
        assert_eq!(slugify_title("Größe Übung"), "Groesse-Uebung");
    }

    #[test]
    fn test_accents_are_stripped() {
        assert_eq!(slugify_title("Café crème brûlée"), "Cafe-creme-brulee");
    }

    #[test]
    fn test_disallowed_runs_collapse_and_trim() {
        assert_eq!(slugify_title("  hello, world!!  "), "hello-world");
        assert_eq!(slugify_title("a/b\\c"), "a-b-c");
        assert_eq!(slugify_title("v1.2_final-draft"), "v1.2_final-draft");
        assert_eq!(slugify_title("   "), "");
        assert_eq!(slugify_title("日本語"), "");
    }

    #[test]
    fn test_slug_is_capped() {
        let long = "x".repeat(200);
        assert_eq!(slugify_title(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_gen_id_is_eight_hex_chars() {
        let id = gen_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_make_basename() {
        assert_eq!(
            make_basename("1a2b3c4d", "Täst Note", created()),
            "2024-05-01_09-30-00_1a2b3c4d_Taest-Note"
        );
        assert_eq!(
            make_basename("1a2b3c4d", "", created()),
            "2024-05-01_09-30-00_1a2b3c4d"
        );
    }

    #[test]
    fn test_rename_keeps_stamp_and_id() {
        let renamed = rename_basename("2024-05-01_09-30-00_1a2b3c4d_Old.md", "1a2b3c4d", "New Name");
        assert_eq!(renamed, "2024-05-01_09-30-00_1a2b3c4d_New-Name");

        let cleared = rename_basename("2024-05-01_09-30-00_1a2b3c4d_Old.md", "1a2b3c4d", "");
        assert_eq!(cleared, "2024-05-01_09-30-00_1a2b3c4d");
    }

    #[test]
    fn test_rename_without_stamp_uses_now() {
        let renamed = rename_basename("imported.md", "1a2b3c4d", "X");
        assert!(renamed.ends_with("_1a2b3c4d_X"));
        assert_eq!(renamed.len(), "2024-05-01_09-30-00_1a2b3c4d_X".len());
    }

    #[test]
    fn test_allocate_retries_on_collision() {
        let mut calls = 0;
        let alloc = allocate("T", created(), |_| {
            calls += 1;
            calls < 3
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert!(alloc.basename.contains(&alloc.id));
    }

    #[test]
    fn test_allocate_exhaustion_is_an_error() {
        let result = allocate("T", created(), |_| true);
        assert!(matches!(result, Err(NoteError::AllocationExhausted)));
    }
}
