//! Single-use token generation and at-rest hashing.
//!
//! One abstraction serves every single-use-token flow on the platform:
//! invitations today, credential resets when that surface lands. The
//! plaintext exists only in memory on the issuing path; the store only ever
//! sees the SHA-256 digest, and lookups recompute the digest from the
//! presented plaintext.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of random bytes in a token (256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// A freshly generated single-use token plaintext.
///
/// Deliberately not serializable and redacted in debug output so it cannot
/// leak into logs or storage. The only way out is [`TokenSecret::reveal`],
/// used once to hand the plaintext to the mail collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);

impl TokenSecret {
    /// Generates a new token from the OS entropy source.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Returns the plaintext token.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }

    /// Returns the digest to persist in place of the plaintext.
    #[must_use]
    pub fn digest(&self) -> String {
        digest(&self.0)
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(..)")
    }
}

/// Computes the at-rest digest of a presented plaintext token.
#[must_use]
pub fn digest(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique() {
        let a = TokenSecret::generate();
        let b = TokenSecret::generate();
        assert_ne!(a.reveal(), b.reveal());
    }

    #[test]
    fn token_has_full_entropy_length() {
        let token = TokenSecret::generate();
        // 32 bytes hex-encoded.
        assert_eq!(token.reveal().len(), 64);
    }

    #[test]
    fn digest_matches_recomputation() {
        let token = TokenSecret::generate();
        assert_eq!(token.digest(), digest(token.reveal()));
    }

    #[test]
    fn digest_differs_from_plaintext() {
        let token = TokenSecret::generate();
        assert_ne!(token.digest(), token.reveal());
        // SHA-256 hex digest length.
        assert_eq!(token.digest().len(), 64);
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = TokenSecret::generate();
        let debug = format!("{token:?}");
        assert_eq!(debug, "TokenSecret(..)");
        assert!(!debug.contains(token.reveal()));
    }
}
