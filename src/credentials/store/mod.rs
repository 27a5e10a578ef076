//! Persistence seam for credentials and sessions.
//!
//! Implementations must enforce email uniqueness themselves (the core never locks)
//! and report a duplicate as [`StoreError::UniqueViolation`]. Every method is a
//! single atomic read or write.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub use super::error::StoreError;

use super::models::{Credential, NewCredential, PublicIdentity, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch a credential by its normalized email.
    async fn find_credential_by_email(&self, email: &str)
    -> Result<Option<Credential>, StoreError>;

    /// Insert a credential; duplicates surface as `UniqueViolation`.
    async fn insert_credential(&self, credential: NewCredential) -> Result<Uuid, StoreError>;

    /// Insert a session; a token digest collision surfaces as `UniqueViolation`.
    async fn insert_session(&self, session: Session) -> Result<(), StoreError>;

    /// Resolve an unexpired session digest to its owner's public identity.
    async fn find_session_identity(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<PublicIdentity>, StoreError>;

    /// Delete a session by digest. Returns whether a row was removed.
    async fn delete_session(&self, token_hash: &[u8]) -> Result<bool, StoreError>;

    /// Drop expired sessions for one credential. Returns the number removed.
    async fn prune_expired_sessions(
        &self,
        credential_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Connectivity probe used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
