//! # Domain Model: Notes, Areas and Metadata
//!
//! This module defines the core data structures for stickynotes: [`NoteMeta`], [`Note`],
//! [`Area`] and [`NoteFormat`], plus the small amount of text normalization that happens
//! before content reaches disk.
//!
//! ## On-Disk Shape
//!
//! A note is a pair of sibling files sharing one basename:
//!
//! ```text
//! 2024-05-01_09-30-00_1a2b3c4d_Meeting-Notes.json   <-- NoteMeta
//! 2024-05-01_09-30-00_1a2b3c4d_Meeting-Notes.md     <-- content (plaintext or token)
//! ```
//!
//! The pair lives in exactly one [`Area`] directory at a time. Metadata is the only file
//! that is required: a missing content file reads as an empty note.
//!
//! ## Metadata Compatibility
//!
//! The JSON keys are an external contract shared with backup and export tooling:
//! `id, created, updated, rev, filename, title, subject, pinned, deleted, encrypted, pdf`.
//! Older files may be missing any of the optional keys, and may carry keys this crate
//! does not know about. Missing keys take defaults; unknown keys are kept in
//! [`NoteMeta::extra`] and written back untouched.
//!
//! ## Citation Markers
//!
//! Content pasted from some assistants carries citations encoded with private-use code
//! points (`U+E200 cite U+E202 … U+E201`). [`normalize_citations`] rewrites them into a
//! readable `[cite: a, b]` form before anything is persisted.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Subject that marks a note as a journal entry.
pub const JOURNAL_SUBJECT: &str = "Journal";

/// Shown in place of content that cannot be decrypted.
pub const DECRYPTION_FAILED_PLACEHOLDER: &str =
    "[Decryption failed \u{2014} wrong passphrase or corrupt data]";

/// Current UTC time at second precision, the resolution used in metadata.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// One of the three lifecycle locations for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Active,
    Journal,
    Trash,
}

impl Area {
    /// Scan order used by lookups and rebuilds.
    pub const ALL: [Area; 3] = [Area::Active, Area::Journal, Area::Trash];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Area::Active => "notes",
            Area::Journal => "journal",
            Area::Trash => "trash",
        }
    }

    pub fn implies_deleted(&self) -> bool {
        matches!(self, Area::Trash)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteFormat {
    #[default]
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "txt")]
    Text,
    Yaml,
    Yml,
}

impl NoteFormat {
    /// Lookup order when locating an existing content file.
    pub const ALL: [NoteFormat; 4] = [
        NoteFormat::Markdown,
        NoteFormat::Text,
        NoteFormat::Yaml,
        NoteFormat::Yml,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            NoteFormat::Markdown => "md",
            NoteFormat::Text => "txt",
            NoteFormat::Yaml => "yaml",
            NoteFormat::Yml => "yml",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        NoteFormat::ALL
            .into_iter()
            .find(|format| format.extension() == ext)
    }
}

/// Traffic-light sensitivity label attached to export preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tlp {
    #[serde(rename = "CLEAR")]
    Clear,
    #[serde(rename = "GREEN")]
    Green,
    #[default]
    #[serde(rename = "AMBER")]
    Amber,
    #[serde(rename = "AMBER+STRICT")]
    AmberStrict,
    #[serde(rename = "RED")]
    Red,
}

impl Tlp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tlp::Clear => "CLEAR",
            Tlp::Green => "GREEN",
            Tlp::Amber => "AMBER",
            Tlp::AmberStrict => "AMBER+STRICT",
            Tlp::Red => "RED",
        }
    }

    /// Lenient parse: anything unrecognized becomes the default label.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for Tlp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLEAR" => Ok(Tlp::Clear),
            "GREEN" => Ok(Tlp::Green),
            "AMBER" => Ok(Tlp::Amber),
            "AMBER+STRICT" => Ok(Tlp::AmberStrict),
            "RED" => Ok(Tlp::Red),
            other => Err(format!("unknown TLP label: {}", other)),
        }
    }
}

impl fmt::Display for Tlp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export formatting preferences stored with each note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfMeta {
    pub author: String,
    pub company: String,
    pub version: String,
    pub date: String,
    pub use_export_date: bool,
    pub tlp: Tlp,
}

impl Default for PdfMeta {
    fn default() -> Self {
        Self {
            author: String::new(),
            company: String::new(),
            version: String::new(),
            date: String::new(),
            use_export_date: true,
            tlp: Tlp::Amber,
        }
    }
}

impl PdfMeta {
    /// Build from loosely-typed JSON, trimming strings and defaulting anything missing.
    /// Non-object input yields the defaults.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let text = |key: &str| -> String {
            match obj.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string().trim().to_string(),
            }
        };
        let use_export_date = match obj.get("use_export_date") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Null) | None => true,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        Self {
            author: text("author"),
            company: text("company"),
            version: text("version"),
            date: text("date"),
            use_export_date,
            tlp: Tlp::parse_lenient(&text("tlp")),
        }
    }

    pub fn normalized(&self) -> Self {
        Self {
            author: self.author.trim().to_string(),
            company: self.company.trim().to_string(),
            version: self.version.trim().to_string(),
            date: self.date.trim().to_string(),
            use_export_date: self.use_export_date,
            tlp: self.tlp,
        }
    }
}

impl<'de> Deserialize<'de> for PdfMeta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(PdfMeta::from_value(&value))
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

// Metadata files may be edited by hand or by other tools: nulls and
// mistyped scalars fall back to defaults instead of hiding the note.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn lenient_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().unwrap_or_else(|_| epoch()),
        _ => epoch(),
    })
}

/// A note's metadata record, as stored in `<basename>.json` and in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMeta {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default = "epoch", deserialize_with = "lenient_time")]
    pub created: DateTime<Utc>,
    #[serde(default = "epoch", deserialize_with = "lenient_time")]
    pub updated: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub rev: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub pinned: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub deleted: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub encrypted: bool,
    #[serde(default)]
    pub pdf: PdfMeta,
    /// Keys written by other tools; preserved across rewrites.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NoteMeta {
    /// Fresh metadata for a note that has just been allocated.
    pub fn new(id: String, filename: String, created: DateTime<Utc>) -> Self {
        Self {
            id,
            created,
            updated: created,
            rev: 1,
            filename,
            title: String::new(),
            subject: String::new(),
            pinned: false,
            deleted: false,
            encrypted: false,
            pdf: PdfMeta::default(),
            extra: Map::new(),
        }
    }

    /// Record one persisted mutation: bump `rev` and refresh `updated`.
    ///
    /// `updated` never moves backwards, even if the wall clock does.
    pub fn touch(&mut self) {
        self.rev += 1;
        let now = now_utc();
        if now > self.updated {
            self.updated = now;
        }
    }

    pub fn is_journal(&self) -> bool {
        self.subject == JOURNAL_SUBJECT
    }

    /// Format implied by the stored filename's extension.
    pub fn format(&self) -> Option<NoteFormat> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(NoteFormat::from_extension)
    }
}

/// A note as handed to callers: metadata plus readable content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub meta: NoteMeta,
    pub content: String,
}

/// Independent, composable metadata changes. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetaPatch {
    pub pinned: Option<bool>,
    /// Display title only; files keep their names.
    pub title: Option<String>,
    /// Renames both files to a slug of this title. Takes precedence over `title`.
    pub user_title: Option<String>,
    pub subject: Option<String>,
}

impl MetaPatch {
    pub fn is_empty(&self) -> bool {
        self.pinned.is_none()
            && self.title.is_none()
            && self.user_title.is_none()
            && self.subject.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Updated,
    Created,
    Filename,
}

impl SortKey {
    /// Unknown keys fall back to `Updated`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "created" => SortKey::Created,
            "filename" => SortKey::Filename,
            _ => SortKey::Updated,
        }
    }
}

const CITE_START: char = '\u{e200}';
const CITE_END: char = '\u{e201}';
const CITE_SEP: char = '\u{e202}';

/// Rewrite private-use citation runs into `[cite: a, b]` and drop stray markers.
pub fn normalize_citations(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let marker = format!("{}cite{}", CITE_START, CITE_SEP);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(&marker) {
        let after = &rest[start + marker.len()..];
        match citation_body_len(after) {
            Some(len) => {
                out.push_str(&rest[..start]);
                let parts: Vec<&str> = after[..len].split(CITE_SEP).filter(|p| !p.is_empty()).collect();
                if parts.is_empty() {
                    out.push_str("[cite]");
                } else {
                    out.push_str("[cite: ");
                    out.push_str(&parts.join(", "));
                    out.push(']');
                }
                rest = &after[len + CITE_END.len_utf8()..];
            }
            None => {
                let skip = start + CITE_START.len_utf8();
                out.push_str(&rest[..skip]);
                rest = &rest[skip..];
            }
        }
    }
    out.push_str(rest);

    out.retain(|c| c != CITE_START && c != CITE_SEP && c != CITE_END);
    out
}

/// Byte length of a non-empty citation body terminated by `CITE_END` on the same line.
fn citation_body_len(after: &str) -> Option<usize> {
    for (i, c) in after.char_indices() {
        if c == '\n' {
            return None;
        }
        if c == CITE_END && i > 0 {
            return Some(i);
        }
    }
    None
}
