//! vaultseal: password-sealed AES-256-GCM envelopes.
//!
//! `seal` derives a key from a password and a fresh salt, encrypts with
//! AES-256-GCM under a fresh nonce, and returns Salt ∥ Nonce ∥ Tag ∥ Ciphertext.
//! `open` reverses it, failing closed on any tampering.

pub mod armor;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;

pub use config::KdfParams;
pub use envelope::{open, seal, seal_with_rng, EnvelopeParts, Sealer, HEADER_LEN};
pub use error::{Result, VaultError};
