use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Malformed envelope: {len} bytes, need at least {min}")]
    MalformedEnvelope { len: usize, min: usize },

    /// Wrong password, corrupted data and tampering all land here on purpose.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Secure random source unavailable")]
    RandomSourceUnavailable(#[source] rand::Error),

    #[error("Plaintext too large for AES-256-GCM: {0} bytes")]
    PlaintextTooLarge(usize),

    #[error("Invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid KDF configuration")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("Invalid base64 envelope encoding")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Truncated frame: header declares {declared} bytes, {available} available")]
    TruncatedFrame { declared: usize, available: usize },

    #[error("Envelope too large to frame: {0} bytes")]
    FrameTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, VaultError>;
