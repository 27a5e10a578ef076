use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored identity record. `password_hash` and `salt` never leave the core.
#[derive(Clone)]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    #[must_use]
    pub fn public_identity(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("salt", &"***")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl<'r> FromRow<'r, PgRow> for Credential {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            salt: row.try_get("salt")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Insert payload for a credential; the hash is already computed.
#[derive(Clone)]
pub struct NewCredential {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl From<NewCredential> for Credential {
    fn from(new: NewCredential) -> Self {
        Self {
            id: new.id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            salt: new.salt,
            created_at: new.created_at,
        }
    }
}

/// Server-side session row keyed by the SHA-256 digest of the raw token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub token_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// The only projection of a credential exposed to callers.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PublicIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
