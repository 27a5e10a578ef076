//! Session token generation and storage digests.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Random bytes behind every session token.
pub const TOKEN_BYTES: usize = 32;

/// Encoded length of a session token (unpadded URL-safe base64 of 32 bytes).
pub const TOKEN_LEN: usize = 43;

/// Create a new session token.
/// The raw value is only returned to the caller; the store keeps its digest.
///
/// # Errors
/// Returns an error if the OS random source is unavailable.
pub fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Cheap shape check so malformed tokens never reach the store.
#[must_use]
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && Base64UrlUnpadded::decode_vec(token).is_ok_and(|bytes| bytes.len() == TOKEN_BYTES)
}

/// Hash a session token so raw values never touch the database.
#[must_use]
pub fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}
