//! Stable hashing helpers
//!
//! Both hashes are deterministic across processes and platforms, unlike
//! `DefaultHasher` which uses random seeding.

use sha2::{Digest, Sha256};

/// FNV-1a hash constants (32-bit).
const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// Compute a 32-bit FNV-1a hash of a byte slice.
pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in data {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
