use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use stickynotes::error::Result;
use stickynotes::model::{Note, NoteMeta};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const PIN_MARKER: &str = "⚲";
const LOCK_MARKER: &str = "🔒";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Message {
    pub level: MessageLevel,
    pub content: String,
}

impl Message {
    pub fn info(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Info, content)
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Success, content)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, content)
    }

    fn new(level: MessageLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }
}

pub(super) fn print_messages(messages: &[Message]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(super) fn print_note(note: &Note) {
    let meta = &note.meta;
    let title = if meta.title.is_empty() {
        meta.filename.as_str()
    } else {
        meta.title.as_str()
    };
    println!("{} {}", meta.id.yellow(), title.bold());
    let mut details = vec![format!("rev {}", meta.rev), meta.filename.clone()];
    if !meta.subject.is_empty() {
        details.push(meta.subject.clone());
    }
    if meta.deleted {
        details.push("in trash".to_string());
    }
    if meta.encrypted {
        details.push("encrypted".to_string());
    }
    println!("{}", details.join(" · ").dimmed());
    println!("--------------------------------");
    println!("{}", note.content);
}

pub(super) fn print_notes(notes: &[NoteMeta]) {
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }

    for meta in notes {
        let left_prefix = if meta.pinned {
            format!("  {} ", PIN_MARKER)
        } else {
            "    ".to_string()
        };
        let id_str = format!("{} ", meta.id);
        let right_suffix = if meta.encrypted {
            format!("{} ", LOCK_MARKER)
        } else {
            "  ".to_string()
        };

        let title = if meta.title.is_empty() {
            meta.filename.as_str()
        } else {
            meta.title.as_str()
        };

        let fixed_width = left_prefix.width() + id_str.width() + right_suffix.width() + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let title_display = truncate_to_width(title, available);
        let padding = available.saturating_sub(title_display.width());

        let id_colored = if meta.deleted {
            id_str.red()
        } else if meta.pinned {
            id_str.yellow()
        } else {
            id_str.normal()
        };

        println!(
            "{}{}{}{}{}{}",
            left_prefix,
            id_colored,
            title_display,
            " ".repeat(padding),
            right_suffix,
            format_time_ago(meta.updated).dimmed()
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_wide_chars() {
        assert_eq!(truncate_to_width("short", 20), "short");
        let cut = truncate_to_width("日本語のタイトル", 7);
        assert!(cut.ends_with('…'));
        assert!(cut.width() <= 7);
    }

    #[test]
    fn test_time_ago_is_right_aligned() {
        let s = format_time_ago(Utc::now());
        assert_eq!(s.chars().count(), TIME_WIDTH);
        assert!(s.trim_start().ends_with("ago") || s.trim_start() == "now");
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::warning("x").level, MessageLevel::Warning);
        assert_eq!(Message::error("y").content, "y");
    }
}
