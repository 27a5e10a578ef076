//! In-process store used by `--in-memory` mode and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::credentials::models::{Credential, NewCredential, PublicIdentity, Session};

#[derive(Default)]
struct State {
    credentials: HashMap<Uuid, Credential>,
    email_index: HashMap<String, Uuid>,
    sessions: HashMap<Vec<u8>, Session>,
}

/// Map-backed store; the write lock doubles as the uniqueness constraint.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn credential_count(&self) -> usize {
        self.state.read().await.credentials.len()
    }

    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .email_index
            .get(email)
            .and_then(|id| state.credentials.get(id))
            .cloned())
    }

    async fn insert_credential(&self, credential: NewCredential) -> Result<Uuid, StoreError> {
        let mut state = self.state.write().await;
        if state.email_index.contains_key(&credential.email)
            || state.credentials.contains_key(&credential.id)
        {
            return Err(StoreError::UniqueViolation);
        }
        let id = credential.id;
        state.email_index.insert(credential.email.clone(), id);
        state.credentials.insert(id, credential.into());
        Ok(id)
    }

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.credentials.contains_key(&session.credential_id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "session references unknown credential {}",
                session.credential_id
            )));
        }
        if state.sessions.contains_key(&session.token_hash) {
            return Err(StoreError::UniqueViolation);
        }
        state.sessions.insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_session_identity(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<PublicIdentity>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .get(token_hash)
            .filter(|session| session.is_active_at(now))
            .and_then(|session| state.credentials.get(&session.credential_id))
            .map(Credential::public_identity))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<bool, StoreError> {
        Ok(self.state.write().await.sessions.remove(token_hash).is_some())
    }

    async fn prune_expired_sessions(
        &self,
        credential_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state
            .sessions
            .retain(|_, session| session.credential_id != credential_id || session.is_active_at(now));
        Ok(u64::try_from(before - state.sessions.len()).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
