//! Envelope module: password-sealed AES-256-GCM envelopes.
//!
//! An envelope is everything `open` needs except the password:
//!
//! ```text
//! Offset  Size  Field
//! 0       16    Salt (random, per envelope)
//! 16      12    Nonce (random, per envelope)
//! 28      16    AES-GCM authentication tag
//! 44      N     Ciphertext (same length as the plaintext)
//! ```
//!
//! There are no length prefixes and no associated data. The ciphertext runs to
//! the end of the buffer, so a 44-byte envelope carries an empty plaintext.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::KdfParams;
use crate::crypto::{self, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{Result, VaultError};

/// Fixed header length: 16 salt + 12 nonce + 16 tag = 44 bytes.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

const TAG_OFFSET: usize = SALT_LEN + NONCE_LEN;

/// Total envelope size for a plaintext of `plaintext_len` bytes.
pub fn envelope_len(plaintext_len: usize) -> usize {
    HEADER_LEN + plaintext_len
}

/// Borrowed view of the four envelope fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeParts<'a> {
    pub salt: &'a [u8; SALT_LEN],
    pub nonce: &'a [u8; NONCE_LEN],
    pub tag: &'a [u8; TAG_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> EnvelopeParts<'a> {
    /// Split an envelope into its fields without copying.
    ///
    /// Fails with `MalformedEnvelope` when the buffer is shorter than the fixed
    /// header. Nothing else is checked here; integrity is the tag's job.
    pub fn parse(envelope: &'a [u8]) -> Result<Self> {
        let malformed = || VaultError::MalformedEnvelope {
            len: envelope.len(),
            min: HEADER_LEN,
        };
        if envelope.len() < HEADER_LEN {
            return Err(malformed());
        }

        let (salt, rest) = envelope
            .split_first_chunk::<SALT_LEN>()
            .ok_or_else(malformed)?;
        let (nonce, rest) = rest
            .split_first_chunk::<NONCE_LEN>()
            .ok_or_else(malformed)?;
        let (tag, ciphertext) = rest.split_first_chunk::<TAG_LEN>().ok_or_else(malformed)?;

        Ok(Self {
            salt,
            nonce,
            tag,
            ciphertext,
        })
    }

    /// Serialize back to Salt ∥ Nonce ∥ Tag ∥ Ciphertext.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut envelope = Vec::with_capacity(envelope_len(self.ciphertext.len()));
        envelope.extend_from_slice(self.salt);
        envelope.extend_from_slice(self.nonce);
        envelope.extend_from_slice(self.tag);
        envelope.extend_from_slice(self.ciphertext);
        envelope
    }
}

/// Seals and opens envelopes under a fixed KDF configuration.
///
/// The envelope does not record which KDF produced its key, so a `Sealer` can
/// only open envelopes sealed with the same `KdfParams`.
#[derive(Debug, Clone, Default)]
pub struct Sealer {
    kdf: KdfParams,
}

impl Sealer {
    pub fn new(kdf: KdfParams) -> Result<Self> {
        kdf.validate()?;
        Ok(Self { kdf })
    }

    /// Build a sealer from a JSON KDF configuration (see `config`).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            kdf: KdfParams::from_json(json)?,
        })
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Seal `plaintext` under `password` using the operating system's CSPRNG.
    pub fn seal(&self, plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        self.seal_with_rng(&mut OsRng, plaintext, password)
    }

    /// Seal `plaintext` under `password`, drawing salt and nonce from `rng`.
    ///
    /// The salt is drawn first and the key derived from it, then the nonce is
    /// drawn as a separate fill. The derived key is wiped before returning.
    pub fn seal_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
        password: &[u8],
    ) -> Result<Vec<u8>> {
        debug!(
            kdf = self.kdf.algorithm(),
            plaintext_len = plaintext.len(),
            "sealing envelope"
        );

        let salt: [u8; SALT_LEN] = crypto::random_bytes(rng)?;
        let key = crypto::derive_key(password, &salt, &self.kdf)?;
        let nonce: [u8; NONCE_LEN] = crypto::random_bytes(rng)?;

        // Encrypt straight into the output buffer; the tag slot is filled afterwards.
        // Zeroizing covers the window where the buffer still holds plaintext.
        let mut envelope = Zeroizing::new(Vec::with_capacity(envelope_len(plaintext.len())));
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&[0u8; TAG_LEN]);
        envelope.extend_from_slice(plaintext);

        let tag = crypto::seal_in_place(&key, &nonce, &mut envelope[HEADER_LEN..])?;
        envelope[TAG_OFFSET..HEADER_LEN].copy_from_slice(&tag);

        Ok(std::mem::take(&mut *envelope))
    }

    /// Open an envelope with `password`.
    ///
    /// Fails with `MalformedEnvelope` before any key derivation when the buffer
    /// is shorter than 44 bytes, and with `AuthenticationFailed` when the tag does
    /// not verify. No partial plaintext is ever returned.
    pub fn open(&self, envelope: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        let parts = EnvelopeParts::parse(envelope).inspect_err(|_| {
            warn!(
                envelope_len = envelope.len(),
                min = HEADER_LEN,
                "rejecting malformed envelope"
            );
        })?;

        debug!(
            kdf = self.kdf.algorithm(),
            ciphertext_len = parts.ciphertext.len(),
            "opening envelope"
        );

        let key = crypto::derive_key(password, parts.salt, &self.kdf)?;

        let mut buffer = Zeroizing::new(parts.ciphertext.to_vec());
        crypto::open_in_place(&key, parts.nonce, parts.tag, &mut buffer).inspect_err(|_| {
            warn!("envelope failed authentication");
        })?;

        Ok(std::mem::take(&mut *buffer))
    }
}

/// Seal with the default KDF (PBKDF2-HMAC-SHA256, 200,000 rounds) and the OS CSPRNG.
pub fn seal(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    Sealer::default().seal(plaintext, password)
}

/// Seal with the default KDF, drawing salt and nonce from `rng`.
pub fn seal_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    plaintext: &[u8],
    password: &[u8],
) -> Result<Vec<u8>> {
    Sealer::default().seal_with_rng(rng, plaintext, password)
}

/// Open an envelope sealed with the default KDF.
pub fn open(envelope: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    Sealer::default().open(envelope, password)
}
