//! API key issuance and verification
//!
//! Keys look like `bsk_live_<43 base64url chars>`. The type prefix plus the
//! first 8 random characters form the lookup prefix stored next to the hash.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

const KEY_TYPE: &str = "bsk";
const LOOKUP_CHARS: usize = 8;

/// Key environment, encoded in the type prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEnvironment {
    Live,
    Test,
}

impl KeyEnvironment {
    pub fn type_prefix(&self) -> &'static str {
        match self {
            Self::Live => "bsk_live_",
            Self::Test => "bsk_test_",
        }
    }
}

/// Freshly issued key material
#[derive(Debug, Clone)]
pub struct IssuedKey {
    /// Full secret, shown once
    pub secret: String,
    pub prefix: String,
    pub hash: String,
}

/// Issues and verifies API key secrets
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    environment: KeyEnvironment,
    key_bytes: usize,
}

impl ApiKeyGenerator {
    pub fn new(environment: KeyEnvironment) -> Self {
        Self {
            environment,
            key_bytes: 32,
        }
    }

    pub fn live() -> Self {
        Self::new(KeyEnvironment::Live)
    }

    pub fn test() -> Self {
        Self::new(KeyEnvironment::Test)
    }

    /// Issue a new random key
    pub fn issue(&self) -> IssuedKey {
        let mut random_bytes = vec![0u8; self.key_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        self.from_secret(&URL_SAFE_NO_PAD.encode(&random_bytes))
    }

    /// Build key material around a known random part (bootstrap keys, tests)
    pub fn from_secret(&self, random_part: &str) -> IssuedKey {
        let secret = format!("{}{}", self.environment.type_prefix(), random_part);
        let prefix = Self::extract_prefix(&secret)
            .map(str::to_string)
            .unwrap_or_else(|| secret.clone());
        let hash = hash_key(&secret);

        IssuedKey {
            secret,
            prefix,
            hash,
        }
    }

    /// Lookup prefix of a presented key, `None` if the key is malformed
    pub fn extract_prefix(key: &str) -> Option<&str> {
        let mut parts = key.splitn(3, '_');
        let key_type = parts.next()?;
        let environment = parts.next()?;
        let random = parts.next()?;

        if key_type != KEY_TYPE || !matches!(environment, "live" | "test") {
            return None;
        }

        if random.len() < LOOKUP_CHARS || !random.is_ascii() {
            return None;
        }

        let end = key_type.len() + environment.len() + 2 + LOOKUP_CHARS;
        Some(&key[..end])
    }

    /// Verify a presented key against a stored hash
    pub fn verify(key: &str, stored_hash: &str) -> bool {
        constant_time_compare(&hash_key(key), stored_hash)
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::live()
    }
}

/// `sha256$<base64url digest>`
pub fn hash_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("sha256${}", URL_SAFE_NO_PAD.encode(digest))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_live_key() {
        let issued = ApiKeyGenerator::live().issue();

        assert!(issued.secret.starts_with("bsk_live_"));
        assert_eq!(issued.prefix.len(), "bsk_live_".len() + 8);
        assert!(issued.secret.starts_with(&issued.prefix));
        assert!(issued.hash.starts_with("sha256$"));
    }

    #[test]
    fn test_issued_keys_are_unique() {
        let generator = ApiKeyGenerator::test();
        let a = generator.issue();
        let b = generator.issue();

        assert_ne!(a.secret, b.secret);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_from_secret_is_deterministic() {
        let generator = ApiKeyGenerator::test();
        let a = generator.from_secret("abcdefgh12345678");
        let b = generator.from_secret("abcdefgh12345678");

        assert_eq!(a.secret, "bsk_test_abcdefgh12345678");
        assert_eq!(a.prefix, "bsk_test_abcdefgh");
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn test_verify() {
        let issued = ApiKeyGenerator::live().issue();

        assert!(ApiKeyGenerator::verify(&issued.secret, &issued.hash));
        assert!(!ApiKeyGenerator::verify("bsk_live_wrongwrongwrong", &issued.hash));
    }

    #[test]
    fn test_extract_prefix() {
        assert_eq!(
            ApiKeyGenerator::extract_prefix("bsk_live_abc12345xyz"),
            Some("bsk_live_abc12345")
        );
        assert_eq!(
            ApiKeyGenerator::extract_prefix("bsk_test_abc12345"),
            Some("bsk_test_abc12345")
        );
        // random part contains underscores
        assert_eq!(
            ApiKeyGenerator::extract_prefix("bsk_live_ab_cd_ef_gh"),
            Some("bsk_live_ab_cd_ef")
        );
    }

    #[test]
    fn test_extract_prefix_rejects_malformed() {
        assert_eq!(ApiKeyGenerator::extract_prefix("noprefix"), None);
        assert_eq!(ApiKeyGenerator::extract_prefix("bsk_live_short"), None);
        assert_eq!(ApiKeyGenerator::extract_prefix("pk_live_abc12345xyz"), None);
        assert_eq!(ApiKeyGenerator::extract_prefix("bsk_prod_abc12345xyz"), None);
        assert_eq!(ApiKeyGenerator::extract_prefix(""), None);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
