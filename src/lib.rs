//! # Sesame (Credential & Session Manager)
//!
//! `sesame` turns plaintext passwords into salted, keyed hashes at signup,
//! verifies them at login, and issues opaque session identifiers that are
//! validated on every authenticated request.
//!
//! ## Credentials
//!
//! Each credential stores `HMAC-SHA256(key = salt, message = password)` next to a
//! 32-byte salt drawn from the OS CSPRNG at creation time. Emails are the identity
//! key and are normalized (trimmed, lowercased) before every lookup, so uniqueness
//! is case-insensitive. Hash comparison is constant-time.
//!
//! ## Sessions
//!
//! A session identifier is 32 random bytes encoded as unpadded URL-safe base64
//! (43 characters). Only its SHA-256 digest is persisted. Sessions expire after a
//! configurable TTL and can be revoked through logout. Clients present the
//! identifier in the `session-id` header (or as a bearer token).
//!
//! ## Errors
//!
//! Unknown email and wrong password collapse into the same `400` response to
//! prevent account enumeration. Store failures are logged and surfaced as a
//! generic `500` without internal detail.

pub mod api;
pub mod cli;
pub mod credentials;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
