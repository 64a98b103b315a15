//! Remote-sync configuration.
//!
//! Only the settings, a status file and a "run requested" trigger live here. A
//! separate sync worker reads `sync/settings.json`, watches for `sync/run_once`
//! and reports through `sync/status.json`; replication itself is not part of
//! this crate.

use crate::crypto::PassphraseSource;
use crate::error::Result;
use crate::store::atomic::{write_atomic_str, write_json};
use crate::store::NoteStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

pub const PASSWORD_MASK: &str = "********";
pub const MIN_INTERVAL_S: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub enabled: bool,
    pub paused: bool,
    pub webdav_url: String,
    pub remote_path: String,
    pub username: String,
    pub password: String,
    pub mode: String,
    pub interval_s: u64,
    pub no_deletes: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            paused: false,
            webdav_url: String::new(),
            remote_path: String::new(),
            username: String::new(),
            password: String::new(),
            mode: "push".to_string(),
            interval_s: 60,
            no_deletes: true,
        }
    }
}

/// Outcome of [`validate`]: the first problem found, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncCheck {
    Ok,
    Invalid(String),
}

fn settings_path<P: PassphraseSource>(store: &NoteStore<P>) -> PathBuf {
    store.layout().sync_dir().join("settings.json")
}

fn status_path<P: PassphraseSource>(store: &NoteStore<P>) -> PathBuf {
    store.layout().sync_dir().join("status.json")
}

fn run_once_path<P: PassphraseSource>(store: &NoteStore<P>) -> PathBuf {
    store.layout().sync_dir().join("run_once")
}

/// Stored settings, or the defaults when missing or unreadable.
fn load_stored<P: PassphraseSource>(store: &NoteStore<P>) -> SyncSettings {
    let path = settings_path(store);
    let Ok(text) = fs::read_to_string(&path) else {
        return SyncSettings::default();
    };
    match serde_json::from_str(&text) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable sync settings");
            SyncSettings::default()
        }
    }
}

/// Current settings with a non-empty password replaced by [`PASSWORD_MASK`].
pub fn settings<P: PassphraseSource>(store: &NoteStore<P>) -> SyncSettings {
    let mut settings = load_stored(store);
    if !settings.password.is_empty() {
        settings.password = PASSWORD_MASK.to_string();
    }
    settings
}

/// Persist settings. Sending the mask back keeps the stored password, and
/// `paused` is kept from the stored settings.
pub fn save<P: PassphraseSource>(store: &NoteStore<P>, incoming: &SyncSettings) -> Result<SyncSettings> {
    let stored = load_stored(store);
    let password = if incoming.password == PASSWORD_MASK {
        stored.password.clone()
    } else {
        incoming.password.clone()
    };
    let mode = incoming.mode.trim();
    let settings = SyncSettings {
        enabled: incoming.enabled,
        paused: stored.paused,
        webdav_url: incoming.webdav_url.trim().to_string(),
        remote_path: incoming.remote_path.trim().to_string(),
        username: incoming.username.trim().to_string(),
        password,
        mode: if mode.is_empty() { "push".to_string() } else { mode.to_string() },
        interval_s: incoming.interval_s.max(MIN_INTERVAL_S),
        no_deletes: incoming.no_deletes,
    };
    write_json(&settings_path(store), &settings)?;
    tracing::info!(
        event = "sync_settings_saved",
        enabled = settings.enabled,
        mode = %settings.mode,
        webdav_url = %settings.webdav_url,
        "sync settings saved"
    );
    Ok(settings)
}

pub fn set_paused<P: PassphraseSource>(store: &NoteStore<P>, paused: bool) -> Result<bool> {
    let mut settings = load_stored(store);
    settings.paused = paused;
    write_json(&settings_path(store), &settings)?;
    tracing::info!(event = "sync_paused", paused, "sync pause toggled");
    Ok(paused)
}

/// Drop the trigger file for the sync worker and mark the status as requested.
pub fn request_run<P: PassphraseSource>(store: &NoteStore<P>) -> Result<DateTime<Utc>> {
    let now = crate::model::now_utc();
    write_atomic_str(&run_once_path(store), &now.timestamp().to_string())?;

    let mut status = Map::new();
    status.insert("last_result".into(), Value::from("requested"));
    status.insert(
        "last_time".into(),
        Value::from(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    if let Err(e) = write_json(&status_path(store), &status) {
        tracing::warn!(error = %e, "could not write sync status");
    }
    tracing::info!(event = "sync_run_requested", "sync run requested");
    Ok(now)
}

/// Whatever the sync worker last reported, or an idle placeholder.
pub fn status<P: PassphraseSource>(store: &NoteStore<P>) -> Value {
    let idle = || {
        serde_json::json!({
            "last_result": "idle",
            "last_time": "never",
        })
    };
    match fs::read_to_string(status_path(store)) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|_| idle()),
        Err(_) => idle(),
    }
}

/// Check connection settings without saving them. Without a candidate the
/// stored settings are checked.
pub fn validate<P: PassphraseSource>(
    store: &NoteStore<P>,
    candidate: Option<&SyncSettings>,
) -> SyncCheck {
    let settings = match candidate {
        Some(c) => c.clone(),
        None => load_stored(store),
    };
    let url = settings.webdav_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return SyncCheck::Invalid("Invalid WebDAV URL".to_string());
    }
    if settings.remote_path.trim().is_empty() {
        return SyncCheck::Invalid("Remote folder is empty".to_string());
    }
    if settings.username.trim().is_empty() {
        return SyncCheck::Invalid("Username is empty".to_string());
    }
    if settings.password.is_empty() {
        return SyncCheck::Invalid("Password / token is empty".to_string());
    }
    SyncCheck::Ok
}
