//! Credential & session core.
//!
//! Flow Overview:
//! - `register`: validate input, draw a salt, hash, insert (email uniqueness is
//!   enforced by the store).
//! - `authenticate`: look up by normalized email, recompute the keyed hash, compare
//!   in constant time, issue a session token.
//! - `validate_session`: check token shape, look up by token digest joined with the
//!   owning credential, return its public identity.
//!
//! Storage is injected as a [`store::CredentialStore`] so the same logic runs over
//! Postgres in production and an in-memory map in tests.

pub mod config;
pub mod error;
pub mod hashing;
pub mod models;
pub mod service;
pub mod store;
pub mod token;
mod utils;

pub use config::AuthConfig;
pub use error::AuthError;
pub use models::{Credential, PublicIdentity, Session};
pub use service::CredentialManager;
pub use store::{CredentialStore, MemoryStore, PgStore, StoreError};
