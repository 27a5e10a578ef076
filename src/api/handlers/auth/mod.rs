//! Auth handlers.
//!
//! Flow Overview:
//! 1) `register` creates a credential and returns its id.
//! 2) `login` verifies the password and returns a session id.
//! 3) Every later request carries the session id in the `session-id` header
//!    (or `Authorization: Bearer`), resolved by `session` or the [`principal::Principal`]
//!    extractor.
//! 4) `logout` deletes the session; it always answers 204.

mod error;
pub mod login;
pub mod principal;
pub mod register;
pub mod session;
pub mod types;

/// Request header that carries the session identifier.
pub const SESSION_HEADER: &str = "session-id";
