//! Keyed password hashing.
//!
//! `password_hash = HMAC-SHA256(key = salt, message = password)`. The salt is 32
//! bytes from the OS CSPRNG and is drawn once per credential at creation time.

use anyhow::{Context, Result, anyhow};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Digest length of HMAC-SHA256 in bytes.
pub const HASH_LEN: usize = 32;

/// Draw a fresh salt from the OS random source.
///
/// # Errors
/// Returns an error if the OS random source is unavailable.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .context("failed to generate password salt")?;
    Ok(salt)
}

fn keyed(salt: &[u8], password: &SecretString) -> Result<HmacSha256> {
    let mut mac =
        HmacSha256::new_from_slice(salt).map_err(|e| anyhow!("invalid HMAC key: {e}"))?;
    mac.update(password.expose_secret().as_bytes());
    Ok(mac)
}

/// Compute the keyed hash of `password` under `salt`.
///
/// # Errors
/// Returns an error if the HMAC cannot be keyed.
pub fn hash_password(password: &SecretString, salt: &[u8]) -> Result<Vec<u8>> {
    Ok(keyed(salt, password)?.finalize().into_bytes().to_vec())
}

/// Recompute the keyed hash and compare it to `expected` in constant time.
#[must_use]
pub fn verify_password(password: &SecretString, salt: &[u8], expected: &[u8]) -> bool {
    keyed(salt, password).is_ok_and(|mac| mac.verify_slice(expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn generate_salt_is_random() -> Result<()> {
        let first = generate_salt()?;
        let second = generate_salt()?;
        assert_eq!(first.len(), SALT_LEN);
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn hash_is_deterministic_for_same_salt() -> Result<()> {
        let salt = [7u8; SALT_LEN];
        let first = hash_password(&secret("secret123"), &salt)?;
        let second = hash_password(&secret("secret123"), &salt)?;
        assert_eq!(first, second);
        assert_eq!(first.len(), HASH_LEN);
        Ok(())
    }

    #[test]
    fn hash_differs_across_salts() -> Result<()> {
        let first = hash_password(&secret("secret123"), &generate_salt()?)?;
        let second = hash_password(&secret("secret123"), &generate_salt()?)?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn hash_is_not_plaintext() -> Result<()> {
        let hash = hash_password(&secret("secret123"), &generate_salt()?)?;
        assert_ne!(hash, b"secret123".to_vec());
        Ok(())
    }

    #[test]
    fn verify_accepts_only_matching_password() -> Result<()> {
        let salt = generate_salt()?;
        let hash = hash_password(&secret("secret123"), &salt)?;
        assert!(verify_password(&secret("secret123"), &salt, &hash));
        assert!(!verify_password(&secret("secret124"), &salt, &hash));
        assert!(!verify_password(&secret(""), &salt, &hash));
        assert!(!verify_password(&secret("secret123"), &[0u8; SALT_LEN], &hash));
        Ok(())
    }

    #[test]
    fn verify_rejects_truncated_hash() -> Result<()> {
        let salt = generate_salt()?;
        let hash = hash_password(&secret("secret123"), &salt)?;
        assert!(!verify_password(&secret("secret123"), &salt, &hash[..16]));
        Ok(())
    }
}
