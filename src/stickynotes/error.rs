use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Note is deleted: {0}")]
    Deleted(String),

    #[error("Target filename already exists: {0}")]
    Conflict(String),

    #[error("No encryption key configured. Set a passphrase first.")]
    NoKeyConfigured,

    #[error("Passphrase is incorrect")]
    WrongPassphrase,

    #[error("Decryption failed: wrong passphrase or corrupt data")]
    DecryptionFailed,

    #[error("Failed to allocate note id")]
    AllocationExhausted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, NoteError>;
