//! Crypto module: password key derivation and AES-256-GCM primitives.
//!
//! Key boundaries are raw fixed-size byte arrays. Derived keys are always
//! returned as `Zeroizing<[u8; 32]>` so they are wiped when the caller drops
//! them, on success and error paths alike.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::config::KdfParams;
use crate::error::{Result, VaultError};

/// Length of the per-envelope random salt.
pub const SALT_LEN: usize = 16;

/// Length of the AES-GCM nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag (128 bits).
pub const TAG_LEN: usize = 16;

/// Length of the derived AES-256 key.
pub const KEY_LEN: usize = 32;

/// Derive a 32-byte key from a password and salt.
///
/// Deterministic: the same password, salt and parameters always produce the same
/// key. Empty passwords are accepted; rejecting them is the caller's policy.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    params.validate()?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);

    match *params {
        KdfParams::Pbkdf2 { iterations } => {
            pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key[..]);
        }
        KdfParams::Argon2id {
            m_cost,
            t_cost,
            p_cost,
        } => {
            let params = Params::new(m_cost, t_cost, p_cost, Some(KEY_LEN))
                .map_err(|e| VaultError::InvalidKdfParams(format!("argon2: {}", e)))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password_into(password, salt, &mut key[..])
                .map_err(|e| VaultError::KeyDerivation(format!("argon2: {}", e)))?;
        }
    }

    Ok(key)
}

/// Draw `N` bytes from a cryptographically secure random source.
///
/// A source that cannot deliver is reported as `RandomSourceUnavailable`; there
/// is no retry and no fallback to a weaker generator.
pub fn random_bytes<const N: usize, R: RngCore + CryptoRng>(rng: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    rng.try_fill_bytes(&mut buf)
        .map_err(VaultError::RandomSourceUnavailable)?;
    Ok(buf)
}

/// Encrypt `buffer` in place with AES-256-GCM and no associated data.
///
/// The buffer keeps its length (GCM is a stream mode); the 16-byte tag is
/// returned separately so the caller decides where it lives in the envelope.
pub fn seal_in_place(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    buffer: &mut [u8],
) -> Result<[u8; TAG_LEN]> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let len = buffer.len();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer)
        .map_err(|_| VaultError::PlaintextTooLarge(len))?;

    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Verify `tag` and decrypt `buffer` in place.
///
/// Any mismatch yields `AuthenticationFailed` with no further detail. The tag is
/// checked before the keystream is applied, but callers must still treat the
/// buffer as garbage on error and wipe it.
pub fn open_in_place(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    tag: &[u8; TAG_LEN],
    buffer: &mut [u8],
) -> Result<()> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer, Tag::from_slice(tag))
        .map_err(|_| VaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fast_pbkdf2() -> KdfParams {
        KdfParams::Pbkdf2 { iterations: 1_000 }
    }

    fn fast_argon2() -> KdfParams {
        KdfParams::Argon2id {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
        }
    }

    // ── Key derivation ──────────────────────────────────────────────────────

    #[test]
    fn test_pbkdf2_matches_rfc7914_vector() {
        // RFC 7914 section 11: PBKDF2-HMAC-SHA256, P="passwd", S="salt", c=1
        let mut out = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut out);
        let expected: [u8; 32] = [
            0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f, 0xec, 0x16, 0x91, 0xc2, 0x25, 0x44,
            0xb6, 0x05, 0xf9, 0x41, 0x85, 0x21, 0x6d, 0xde, 0x04, 0x65, 0xe6, 0x8b, 0x9d, 0x57,
            0xc2, 0x0d, 0xac, 0xbc,
        ];
        assert_eq!(out, expected, "PBKDF2-HMAC-SHA256 backend must match RFC 7914");
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [5u8; SALT_LEN];
        let key1 = derive_key(b"my-password", &salt, &fast_pbkdf2())
            .expect("first derivation should succeed");
        let key2 = derive_key(b"my-password", &salt, &fast_pbkdf2())
            .expect("second derivation should succeed");
        assert_eq!(*key1, *key2, "same inputs must produce same key");
        assert_ne!(*key1, [0u8; KEY_LEN], "derived key must not be all zeros");
    }

    #[test]
    fn test_derive_key_different_salts_produce_different_keys() {
        let key_a = derive_key(b"pw", &[1u8; SALT_LEN], &fast_pbkdf2())
            .expect("derivation should succeed for salt_a");
        let key_b = derive_key(b"pw", &[2u8; SALT_LEN], &fast_pbkdf2())
            .expect("derivation should succeed for salt_b");
        assert_ne!(*key_a, *key_b, "different salts must produce different keys");
    }

    #[test]
    fn test_derive_key_different_passwords_produce_different_keys() {
        let salt = [1u8; SALT_LEN];
        let key_a = derive_key(b"alpha", &salt, &fast_pbkdf2()).expect("derive alpha");
        let key_b = derive_key(b"bravo", &salt, &fast_pbkdf2()).expect("derive bravo");
        assert_ne!(*key_a, *key_b, "different passwords must produce different keys");
    }

    #[test]
    fn test_derive_key_iteration_count_matters() {
        let salt = [9u8; SALT_LEN];
        let key_a = derive_key(b"pw", &salt, &KdfParams::Pbkdf2 { iterations: 1_000 })
            .expect("derive 1000 rounds");
        let key_b = derive_key(b"pw", &salt, &KdfParams::Pbkdf2 { iterations: 1_001 })
            .expect("derive 1001 rounds");
        assert_ne!(*key_a, *key_b, "round count must change the derived key");
    }

    #[test]
    fn test_derive_key_accepts_empty_password() {
        let key = derive_key(b"", &[3u8; SALT_LEN], &fast_pbkdf2())
            .expect("empty password is derivable");
        assert_ne!(*key, [0u8; KEY_LEN], "derived key must not be all zeros");
    }

    #[test]
    fn test_argon2id_distinct_from_pbkdf2() {
        let salt = [7u8; SALT_LEN];
        let pbkdf2_key = derive_key(b"same-password", &salt, &fast_pbkdf2())
            .expect("pbkdf2 derivation should succeed");
        let argon_key = derive_key(b"same-password", &salt, &fast_argon2())
            .expect("argon2id derivation should succeed");
        assert_ne!(
            *pbkdf2_key, *argon_key,
            "different KDFs must produce different keys"
        );
    }

    #[test]
    fn test_argon2id_deterministic() {
        let salt = [8u8; SALT_LEN];
        let key1 = derive_key(b"pw", &salt, &fast_argon2()).expect("first argon2id");
        let key2 = derive_key(b"pw", &salt, &fast_argon2()).expect("second argon2id");
        assert_eq!(*key1, *key2, "argon2id must be deterministic");
    }

    #[test]
    fn test_derive_key_rejects_zero_iterations() {
        let result = derive_key(b"pw", &[0u8; SALT_LEN], &KdfParams::Pbkdf2 { iterations: 0 });
        assert!(
            matches!(result, Err(VaultError::InvalidKdfParams(_))),
            "zero iterations must not derive a key"
        );
    }

    #[test]
    fn test_derive_key_rejects_what_config_rejects() {
        let bad = [
            KdfParams::Pbkdf2 { iterations: 0 },
            KdfParams::Argon2id {
                m_cost: 1,
                t_cost: 1,
                p_cost: 1,
            },
        ];
        for params in bad {
            let from_config = params
                .validate()
                .expect_err("config must reject these params")
                .to_string();
            let from_kdf = derive_key(b"pw", &[0u8; SALT_LEN], &params)
                .expect_err("derive_key must reject these params")
                .to_string();
            assert_eq!(
                from_config, from_kdf,
                "derive_key and config validation must report the same error for {:?}",
                params
            );
        }
    }

    // ── Random source ───────────────────────────────────────────────────────

    #[test]
    fn test_random_bytes_seeded_source_is_reproducible() {
        let a: [u8; SALT_LEN] =
            random_bytes(&mut StdRng::seed_from_u64(11)).expect("seeded rng should fill");
        let b: [u8; SALT_LEN] =
            random_bytes(&mut StdRng::seed_from_u64(11)).expect("seeded rng should fill");
        assert_eq!(a, b, "same seed must produce same bytes");
    }

    #[test]
    fn test_random_bytes_consecutive_draws_differ() {
        let mut rng = StdRng::seed_from_u64(12);
        let salt: [u8; SALT_LEN] = random_bytes(&mut rng).expect("salt draw");
        let nonce: [u8; NONCE_LEN] = random_bytes(&mut rng).expect("nonce draw");
        assert_ne!(&salt[..NONCE_LEN], &nonce[..], "salt and nonce must be independent draws");
    }

    // ── AES-256-GCM ─────────────────────────────────────────────────────────

    #[test]
    fn test_seal_open_in_place_round_trip() {
        let key = [42u8; KEY_LEN];
        let nonce = [1u8; NONCE_LEN];
        let mut buffer = b"attack at dawn".to_vec();

        let tag = seal_in_place(&key, &nonce, &mut buffer).expect("seal should succeed");
        assert_eq!(buffer.len(), 14, "ciphertext must be the same length as plaintext");
        assert_ne!(buffer.as_slice(), b"attack at dawn", "buffer must be encrypted");

        open_in_place(&key, &nonce, &tag, &mut buffer).expect("open should succeed");
        assert_eq!(buffer.as_slice(), b"attack at dawn");
    }

    #[test]
    fn test_open_in_place_wrong_tag_fails() {
        let key = [42u8; KEY_LEN];
        let nonce = [1u8; NONCE_LEN];
        let mut buffer = b"attack at dawn".to_vec();
        let mut tag = seal_in_place(&key, &nonce, &mut buffer).expect("seal should succeed");
        tag[0] ^= 0x01;

        let result = open_in_place(&key, &nonce, &tag, &mut buffer);
        assert!(
            matches!(result, Err(VaultError::AuthenticationFailed)),
            "modified tag must fail authentication"
        );
    }

    #[test]
    fn test_open_in_place_wrong_nonce_fails() {
        let key = [42u8; KEY_LEN];
        let mut buffer = b"attack at dawn".to_vec();
        let tag = seal_in_place(&key, &[1u8; NONCE_LEN], &mut buffer).expect("seal");

        let result = open_in_place(&key, &[2u8; NONCE_LEN], &tag, &mut buffer);
        assert!(
            matches!(result, Err(VaultError::AuthenticationFailed)),
            "wrong nonce must fail authentication"
        );
    }

    #[test]
    fn test_seal_in_place_empty_buffer_still_produces_tag() {
        let mut buffer: Vec<u8> = Vec::new();
        let tag = seal_in_place(&[3u8; KEY_LEN], &[4u8; NONCE_LEN], &mut buffer)
            .expect("empty seal should succeed");
        assert_ne!(tag, [0u8; TAG_LEN], "tag over empty input must not be all zeros");
        open_in_place(&[3u8; KEY_LEN], &[4u8; NONCE_LEN], &tag, &mut buffer)
            .expect("empty open should succeed");
    }
}
