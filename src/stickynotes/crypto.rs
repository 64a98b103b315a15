//! # Encryption Gate
//!
//! Optional, per-note encryption at rest keyed by a single user passphrase.
//!
//! ## Key Derivation
//!
//! The 256-bit content key is derived with Argon2id from the passphrase and a fixed,
//! application-specific salt. The salt is fixed so that every process derives the same key
//! from the same passphrase without storing anything but the passphrase itself; the cost
//! parameters ([`KdfParams`]) make each guess expensive.
//!
//! Derivation is slow on purpose, so the gate caches the derived key together with a
//! SHA-256 fingerprint of the passphrase it came from. The cache is consulted on every
//! call and re-derives only when the configured passphrase no longer matches the
//! fingerprint. Changing or clearing the passphrase through the gate drops the cache.
//!
//! ## Token Format
//!
//! ```text
//! base64url_nopad( 0x01 | nonce[12] | AES-256-GCM ciphertext + tag[16] )
//! ```
//!
//! Tokens are plain ASCII so they can live in the note's ordinary content file. Anything
//! that is not a well-formed, authentic version-1 token fails with
//! [`NoteError::DecryptionFailed`], including the empty string, so a broken encrypted
//! note is never mistaken for an empty one.
//!
//! ## Passphrase Sources
//!
//! Where the passphrase lives is behind [`PassphraseSource`]: [`SettingsFile`] is the
//! JSON file used in production and [`MemPassphrase`] keeps it in memory for tests.

use crate::error::{NoteError, Result};
use crate::store::atomic::write_json;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use zeroize::{Zeroize, ZeroizeOnDrop};

const KDF_SALT: &[u8] = b"stickynotes-encryption-v1";
const TOKEN_VERSION: u8 = 0x01;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MiB
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Minimal cost. Only for tests.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Storage for the one configured passphrase.
pub trait PassphraseSource: Send + Sync {
    /// The configured passphrase, or `None` when encryption is disabled.
    fn load(&self) -> Result<Option<String>>;

    /// Replace (`Some`) or remove (`None`) the passphrase.
    fn save(&self, passphrase: Option<&str>) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EncryptionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    passphrase: Option<String>,
}

/// `encryption.json` holding `{"passphrase": "..."}`; absent, empty or
/// unreadable means disabled.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PassphraseSource for SettingsFile {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let settings: EncryptionSettings = match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable encryption settings");
                return Ok(None);
            }
        };
        Ok(settings.passphrase.filter(|p| !p.is_empty()))
    }

    fn save(&self, passphrase: Option<&str>) -> Result<()> {
        let settings = EncryptionSettings {
            passphrase: passphrase.map(str::to_string),
        };
        write_json(&self.path, &settings)
    }
}

/// In-memory passphrase, for tests and embedding. Clones share one slot.
#[derive(Debug, Default, Clone)]
pub struct MemPassphrase {
    passphrase: Arc<RwLock<Option<String>>>,
}

impl MemPassphrase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passphrase(passphrase: &str) -> Self {
        Self {
            passphrase: Arc::new(RwLock::new(Some(passphrase.to_string()))),
        }
    }
}

impl PassphraseSource for MemPassphrase {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .passphrase
            .read()
            .map_err(|_| NoteError::Store("passphrase lock poisoned".to_string()))?;
        Ok(guard.clone().filter(|p| !p.is_empty()))
    }

    fn save(&self, passphrase: Option<&str>) -> Result<()> {
        let mut guard = self
            .passphrase
            .write()
            .map_err(|_| NoteError::Store("passphrase lock poisoned".to_string()))?;
        *guard = passphrase.map(str::to_string);
        Ok(())
    }
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct DerivedKey {
    key: [u8; 32],
}

struct CachedKey {
    fingerprint: [u8; 32],
    key: Arc<DerivedKey>,
}

fn fingerprint(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

fn derive_key(passphrase: &str, params: &KdfParams) -> Result<DerivedKey> {
    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| NoteError::Store(format!("invalid key derivation parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase.as_bytes(), KDF_SALT, &mut key)
        .map_err(|e| NoteError::Store(format!("key derivation failed: {}", e)))?;
    Ok(DerivedKey { key })
}

/// Transparent encrypt/decrypt of note content with a cached derived key.
pub struct EncryptionGate<P: PassphraseSource = SettingsFile> {
    source: P,
    params: KdfParams,
    cache: Mutex<Option<CachedKey>>,
    derivations: AtomicUsize,
}

impl<P: PassphraseSource> EncryptionGate<P> {
    pub fn new(source: P, params: KdfParams) -> Self {
        Self {
            source,
            params,
            cache: Mutex::new(None),
            derivations: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(self.source.load()?.is_some())
    }

    /// How many times a key has been derived by this gate.
    pub fn derivation_count(&self) -> usize {
        self.derivations.load(Ordering::Relaxed)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = self.key()?;
        let cipher = Aes256Gcm::new_from_slice(&key.key)
            .map_err(|e| NoteError::Store(format!("invalid key: {}", e)))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| NoteError::Store("encryption failed".to_string()))?;

        let mut raw = Vec::with_capacity(1 + NONCE_LEN + sealed.len());
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    pub fn decrypt(&self, token: &str) -> Result<String> {
        let key = self.key()?;
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| NoteError::DecryptionFailed)?;
        if raw.len() < 1 + NONCE_LEN + TAG_LEN || raw[0] != TOKEN_VERSION {
            return Err(NoteError::DecryptionFailed);
        }
        let (nonce, sealed) = raw[1..].split_at(NONCE_LEN);

        let cipher =
            Aes256Gcm::new_from_slice(&key.key).map_err(|_| NoteError::DecryptionFailed)?;
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| NoteError::DecryptionFailed)?;
        String::from_utf8(plain).map_err(|_| NoteError::DecryptionFailed)
    }

    /// Check a presented passphrase against the configured one.
    pub fn verify(&self, presented: &str) -> Result<()> {
        match self.source.load()? {
            None => Err(NoteError::NoKeyConfigured),
            Some(current) if current == presented.trim() => Ok(()),
            Some(_) => Err(NoteError::WrongPassphrase),
        }
    }

    /// Configure a new passphrase. When one is already set, `current` must match it.
    ///
    /// Returns `true` when an existing key was replaced by a different one; notes
    /// encrypted under the old key are unreadable from then on.
    pub fn set_passphrase(&self, passphrase: &str, current: Option<&str>) -> Result<bool> {
        let passphrase = passphrase.trim();
        if passphrase.is_empty() {
            return Err(NoteError::InvalidInput(
                "Passphrase cannot be empty".to_string(),
            ));
        }
        let previous = self.source.load()?;
        if let Some(old) = &previous {
            if current.map(str::trim) != Some(old.as_str()) {
                return Err(NoteError::WrongPassphrase);
            }
        }
        self.source.save(Some(passphrase))?;
        self.invalidate();
        Ok(previous.is_some_and(|old| old != passphrase))
    }

    /// Remove the passphrase. Callers decrypt existing notes first.
    pub fn clear_passphrase(&self) -> Result<()> {
        self.source.save(None)?;
        self.invalidate();
        Ok(())
    }

    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = None;
        }
    }

    fn key(&self) -> Result<Arc<DerivedKey>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| NoteError::Store("key cache lock poisoned".to_string()))?;

        let Some(passphrase) = self.source.load()? else {
            *cache = None;
            return Err(NoteError::NoKeyConfigured);
        };
        let print = fingerprint(&passphrase);
        if let Some(cached) = cache.as_ref() {
            if cached.fingerprint == print {
                return Ok(Arc::clone(&cached.key));
            }
        }

        let key = Arc::new(derive_key(&passphrase, &self.params)?);
        self.derivations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("derived content encryption key");
        *cache = Some(CachedKey {
            fingerprint: print,
            key: Arc::clone(&key),
        });
        Ok(key)
    }
}
