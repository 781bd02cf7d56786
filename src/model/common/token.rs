use std::fmt::{Display, Formatter};

use data_encoding::BASE32_NOPAD;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Number of random bytes in a vote token.
const TOKEN_BYTES: usize = 20;

/// An opaque receipt proving that a vote was recorded.
///
/// Tokens are purely random, so they reveal nothing about the choice they
/// were issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteToken(String);

impl VoteToken {
    /// Generate a fresh token from the given RNG.
    pub fn generate(mut rng: impl RngCore + CryptoRng) -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(BASE32_NOPAD.encode(&bytes))
    }

    /// Generate a fresh token from the thread-local RNG.
    pub fn random() -> Self {
        Self::generate(rand::thread_rng())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VoteToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
