//! Content checksums for snapshot payloads
//!
//! Digests are self-describing (`<algorithm>:<hex>`) so that a payload can
//! be verified with whichever hasher produced it, regardless of the hasher
//! currently configured.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const SHA256_PREFIX: &str = "sha256";
const FNV1A64_PREFIX: &str = "fnv1a64";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A deterministic content hash over raw bytes
pub trait ContentHasher: Send + Sync {
    /// Algorithm name used as the digest prefix
    fn algorithm(&self) -> &'static str;

    /// Raw hex digest of `bytes`
    fn hex_digest(&self, bytes: &[u8]) -> String;

    /// Self-describing digest of `bytes`
    fn checksum(&self, bytes: &[u8]) -> String {
        format!("{}:{}", self.algorithm(), self.hex_digest(bytes))
    }
}

/// SHA-256 digest
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn algorithm(&self) -> &'static str {
        SHA256_PREFIX
    }

    fn hex_digest(&self, bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }
}

/// 64-bit FNV-1a rolling hash
///
/// Detects accidental corruption only; offers no resistance to deliberate
/// tampering.
#[derive(Debug, Default, Clone, Copy)]
pub struct RollingHasher;

impl RollingHasher {
    fn hash(bytes: &[u8]) -> u64 {
        bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
        })
    }
}

impl ContentHasher for RollingHasher {
    fn algorithm(&self) -> &'static str {
        FNV1A64_PREFIX
    }

    fn hex_digest(&self, bytes: &[u8]) -> String {
        format!("{:016x}", Self::hash(bytes))
    }
}

/// Which hasher to use for new snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Rolling,
}

impl HashAlgorithm {
    /// Build the hasher for this algorithm
    pub fn hasher(self) -> Box<dyn ContentHasher> {
        match self {
            Self::Sha256 => Box::new(Sha256Hasher),
            Self::Rolling => Box::new(RollingHasher),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Rolling => write!(f, "rolling"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "rolling" | "fnv1a64" => Ok(Self::Rolling),
            other => Err(format!("Unknown hash algorithm: {}", other)),
        }
    }
}

/// Outcome of checking bytes against a stored digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// Recomputed digest equals the stored one
    Match,
    /// Recomputed digest differs
    Mismatch { expected: String, actual: String },
    /// The stored digest names an algorithm we do not implement
    UnknownAlgorithm(String),
}

impl ChecksumStatus {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Recompute the digest of `bytes` with the algorithm named in `expected`
pub fn verify_checksum(bytes: &[u8], expected: &str) -> ChecksumStatus {
    let algorithm = expected.split_once(':').map(|(prefix, _)| prefix);
    let hasher: Box<dyn ContentHasher> = match algorithm {
        Some(SHA256_PREFIX) => Box::new(Sha256Hasher),
        Some(FNV1A64_PREFIX) => Box::new(RollingHasher),
        Some(other) => return ChecksumStatus::UnknownAlgorithm(other.to_string()),
        None => return ChecksumStatus::UnknownAlgorithm(expected.to_string()),
    };

    let actual = hasher.checksum(bytes);
    if actual == expected {
        ChecksumStatus::Match
    } else {
        ChecksumStatus::Mismatch {
            expected: expected.to_string(),
            actual,
        }
    }
}
