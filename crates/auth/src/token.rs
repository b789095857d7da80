//! Opaque bearer tokens.

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a token; rendered as twice as many hex chars.
pub const TOKEN_BYTES: usize = 20;

/// Opaque API token (40 lowercase hex characters).
///
/// `Debug` is redacted so tokens do not end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Mint a fresh random token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accept a presented key only if it has the shape of a token.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let well_formed = key.len() == TOKEN_BYTES * 2
            && key.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Debug for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Token(****)")
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_tokens_are_40_hex_chars() {
        for _ in 0..64 {
            let token = Token::generate();
            assert_eq!(token.as_str().len(), 40);
            assert!(Token::parse(token.as_str()).is_some());
        }
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(Token::generate(), Token::generate());
    }

    #[test]
    fn debug_is_redacted() {
        let token = Token::generate();
        let dbg = format!("{token:?}");
        assert!(!dbg.contains(token.as_str()));
    }

    proptest! {
        #[test]
        fn parse_rejects_anything_not_token_shaped(key in "[^0-9a-f]{1,60}") {
            prop_assert!(Token::parse(&key).is_none());
        }

        #[test]
        fn parse_accepts_any_lowercase_hex_of_token_length(key in "[0-9a-f]{40}") {
            let token = Token::parse(&key).unwrap();
            prop_assert_eq!(token.as_str(), key.as_str());
        }
    }
}
