//! KDF configuration.
//!
//! The envelope carries no KDF identifier, so the parameters here are shared
//! configuration: whatever sealed an envelope must be reproduced exactly on the
//! opening side. Parameters can be built in code or loaded from JSON:
//!
//! ```text
//! {"algorithm": "pbkdf2", "iterations": 200000}
//! {"algorithm": "argon2id", "m_cost": 65536, "t_cost": 3, "p_cost": 1}
//! ```

use serde::{Deserialize, Serialize};

use crate::crypto::KEY_LEN;
use crate::error::{Result, VaultError};

/// Default PBKDF2-HMAC-SHA256 round count.
pub const PBKDF2_DEFAULT_ITERATIONS: u32 = 200_000;

/// Default Argon2id memory cost in KiB (64 MB).
pub const ARGON2_DEFAULT_M_COST: u32 = 65536;

/// Default Argon2id iteration count.
pub const ARGON2_DEFAULT_T_COST: u32 = 3;

/// Default Argon2id parallelism.
pub const ARGON2_DEFAULT_P_COST: u32 = 1;

/// Password-based key derivation function and its cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum KdfParams {
    /// PBKDF2 with HMAC-SHA256 as the PRF.
    Pbkdf2 {
        #[serde(default = "default_iterations")]
        iterations: u32,
    },
    /// Argon2id (memory-hard).
    Argon2id {
        #[serde(default = "default_m_cost")]
        m_cost: u32,
        #[serde(default = "default_t_cost")]
        t_cost: u32,
        #[serde(default = "default_p_cost")]
        p_cost: u32,
    },
}

fn default_iterations() -> u32 {
    PBKDF2_DEFAULT_ITERATIONS
}

fn default_m_cost() -> u32 {
    ARGON2_DEFAULT_M_COST
}

fn default_t_cost() -> u32 {
    ARGON2_DEFAULT_T_COST
}

fn default_p_cost() -> u32 {
    ARGON2_DEFAULT_P_COST
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfParams::Pbkdf2 {
            iterations: PBKDF2_DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Argon2id with the default cost parameters.
    pub fn argon2id() -> Self {
        KdfParams::Argon2id {
            m_cost: ARGON2_DEFAULT_M_COST,
            t_cost: ARGON2_DEFAULT_T_COST,
            p_cost: ARGON2_DEFAULT_P_COST,
        }
    }

    /// Short algorithm name, used in log events.
    pub fn algorithm(&self) -> &'static str {
        match self {
            KdfParams::Pbkdf2 { .. } => "pbkdf2",
            KdfParams::Argon2id { .. } => "argon2id",
        }
    }

    /// Reject parameters that cannot produce a key.
    pub fn validate(&self) -> Result<()> {
        match *self {
            KdfParams::Pbkdf2 { iterations } => {
                if iterations == 0 {
                    return Err(VaultError::InvalidKdfParams(
                        "pbkdf2 iterations must be at least 1".to_string(),
                    ));
                }
                Ok(())
            }
            KdfParams::Argon2id {
                m_cost,
                t_cost,
                p_cost,
            } => {
                argon2::Params::new(m_cost, t_cost, p_cost, Some(KEY_LEN))
                    .map_err(|e| VaultError::InvalidKdfParams(format!("argon2: {}", e)))?;
                Ok(())
            }
        }
    }

    /// Parse and validate parameters from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: KdfParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
