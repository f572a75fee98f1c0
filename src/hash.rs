// src/hash.rs

//! Content addressing for package payloads
//!
//! Two algorithms are supported:
//! - **SHA-256**: default, cryptographic; addresses survive hostile inputs
//! - **XXH128**: non-cryptographic, much faster; fine for private stores
//!
//! Payload addresses are lowercase hex strings. The algorithm is a property of
//! the store, not of each address, so addresses are not prefixed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::xxh3_128;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (256-bit cryptographic hash)
    #[default]
    Sha256,

    /// XXH128 (128-bit non-cryptographic hash)
    Xxh128,
}

impl HashAlgorithm {
    /// Length of an address produced by this algorithm, in hex characters
    #[inline]
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Xxh128 => 32,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Xxh128 => "xxh128",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "xxh128" | "xxhash" | "xxh3" => Ok(Self::Xxh128),
            _ => Err(format!("unknown hash algorithm: {s}")),
        }
    }
}

/// Compute the content address of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            format!("{:x}", hasher.finalize())
        }
        HashAlgorithm::Xxh128 => format!("{:032x}", xxh3_128(data)),
    }
}

/// Compute SHA-256 hash
#[inline]
pub fn sha256(data: &[u8]) -> String {
    hash_bytes(HashAlgorithm::Sha256, data)
}

/// Check that `data` hashes to `expected`, returning the actual hash on mismatch
pub fn verify_bytes(
    algorithm: HashAlgorithm,
    data: &[u8],
    expected: &str,
) -> Result<(), String> {
    let actual = hash_bytes(algorithm, data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_hex_lengths() {
        for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Xxh128] {
            assert_eq!(hash_bytes(algorithm, b"payload").len(), algorithm.hex_len());
        }
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("SHA256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha256));
        assert_eq!("xxh3".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Xxh128));
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_verify_bytes() {
        let expected = sha256(b"data");
        assert!(verify_bytes(HashAlgorithm::Sha256, b"data", &expected).is_ok());
        assert!(verify_bytes(HashAlgorithm::Sha256, b"other", &expected).is_err());
        assert!(
            verify_bytes(HashAlgorithm::Sha256, b"data", &expected.to_uppercase()).is_ok()
        );
    }
}
