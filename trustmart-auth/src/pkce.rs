//! PKCE (Proof Key for Code Exchange, RFC 7636) with the S256 method.
//!
//! The verifier is 64 random bytes encoded as base64url without padding.
//! The challenge is the base64url (no padding) SHA-256 digest of the
//! verifier's UTF-8 bytes.
//!
//! Randomness comes from an [`EntropySource`]. When the source fails,
//! generation fails; there is no fallback to a weaker generator.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use trustmart_core::PkceError;

/// Number of random bytes in a verifier.
pub const VERIFIER_BYTES: usize = 64;

/// Challenge method sent with the authorization request.
pub const CHALLENGE_METHOD: &str = "S256";

/// Source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync + fmt::Debug {
    /// Fill `buf` completely or fail.
    fn fill(&self, buf: &mut [u8]) -> Result<(), PkceError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), PkceError> {
        getrandom::getrandom(buf).map_err(|e| PkceError::EntropyUnavailable(e.to_string()))
    }
}

/// Secret half of a PKCE pair. Only sent at token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Verifier(String);

impl Verifier {
    /// Wrap a verifier read back from storage.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The encoded verifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the encoded string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

// Kept out of logs.
impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Verifier(..)")
    }
}

/// Public half of a PKCE pair, sent in the authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge(String);

impl Challenge {
    /// The encoded challenge.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A verifier and the challenge derived from it.
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Secret verifier.
    pub verifier: Verifier,
    /// Derived challenge.
    pub challenge: Challenge,
}

impl PkcePair {
    /// Check that `challenge` was derived from `verifier`.
    ///
    /// This is the check the backend applies at exchange time.
    #[must_use]
    pub fn verify(verifier: &Verifier, challenge: &Challenge) -> bool {
        derive_challenge(verifier) == *challenge
    }
}

/// Generates PKCE pairs from an injected entropy source.
#[derive(Debug, Clone)]
pub struct PkceGenerator {
    source: Arc<dyn EntropySource>,
}

impl Default for PkceGenerator {
    fn default() -> Self {
        Self::system()
    }
}

impl PkceGenerator {
    /// Use a custom source.
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Use the operating system CSPRNG.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemEntropy))
    }

    /// Draw a fresh verifier.
    pub fn generate_verifier(&self) -> Result<Verifier, PkceError> {
        let mut bytes = [0u8; VERIFIER_BYTES];
        self.source.fill(&mut bytes)?;
        Ok(Verifier(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Draw a verifier and derive its challenge.
    pub fn create_pair(&self) -> Result<PkcePair, PkceError> {
        let verifier = self.generate_verifier()?;
        let challenge = derive_challenge(&verifier);
        Ok(PkcePair {
            verifier,
            challenge,
        })
    }
}

/// Derive the S256 challenge for a verifier.
pub fn derive_challenge(verifier: &Verifier) -> Challenge {
    let digest = Sha256::digest(verifier.as_str().as_bytes());
    Challenge(URL_SAFE_NO_PAD.encode(digest))
}

/// Draw a verifier from the operating system CSPRNG.
pub fn generate_verifier() -> Result<Verifier, PkceError> {
    PkceGenerator::system().generate_verifier()
}

/// Draw a pair from the operating system CSPRNG.
pub fn create_pair() -> Result<PkcePair, PkceError> {
    PkceGenerator::system().create_pair()
}
