use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::config::AuthConfig;
use super::error::{AuthError, StoreError};
use super::hashing::{self, HASH_LEN, SALT_LEN};
use super::models::{NewCredential, PublicIdentity, Session};
use super::store::CredentialStore;
use super::token;
use super::utils::{normalize_email, required, valid_email};

/// Token digest collisions are retried this many times before giving up.
const SESSION_INSERT_ATTEMPTS: usize = 3;

/// Entry point for the three credential flows plus logout.
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    config: AuthConfig,
}

impl CredentialManager {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a credential and return its id.
    ///
    /// # Errors
    /// `Validation` for missing or malformed input, `DuplicateIdentity` when the
    /// normalized email is taken, `Store`/`Internal` otherwise.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<Uuid, AuthError> {
        let name = required(name).ok_or_else(|| AuthError::validation("Missing name"))?;
        let email = required(email).ok_or_else(|| AuthError::validation("Missing email"))?;
        let password = password
            .filter(|password| !password.expose_secret().is_empty())
            .ok_or_else(|| AuthError::validation("Missing password"))?;

        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::validation("Invalid email"));
        }

        if self.store.find_credential_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let salt = hashing::generate_salt().map_err(AuthError::Internal)?;
        let password_hash = hashing::hash_password(password, &salt).map_err(AuthError::Internal)?;

        let credential = NewCredential {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            password_hash,
            salt: salt.to_vec(),
            created_at: Utc::now(),
        };

        match self.store.insert_credential(credential).await {
            Ok(id) => {
                debug!(credential_id = %id, "credential registered");
                Ok(id)
            }
            // Lost a concurrent signup race for the same email.
            Err(StoreError::UniqueViolation) => Err(AuthError::DuplicateIdentity),
            Err(err) => Err(err.into()),
        }
    }

    /// Verify an email/password pair and issue a session token.
    ///
    /// # Errors
    /// `Validation` for missing input, `InvalidCredentials` for an unknown email
    /// or wrong password, `Store`/`Internal` otherwise.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<String, AuthError> {
        let email = required(email).ok_or_else(|| AuthError::validation("Missing email"))?;
        let password = password
            .filter(|password| !password.expose_secret().is_empty())
            .ok_or_else(|| AuthError::validation("Missing password"))?;

        let email = normalize_email(email);
        let Some(credential) = self.store.find_credential_by_email(&email).await? else {
            // Spend one HMAC so unknown emails cost the same as a bad password.
            let _ = hashing::verify_password(password, &[0u8; SALT_LEN], &[0u8; HASH_LEN]);
            return Err(AuthError::InvalidCredentials);
        };

        if !hashing::verify_password(password, &credential.salt, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let ttl = Duration::from_std(self.config.session_ttl())
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("invalid session ttl: {e}")))?;

        for _ in 0..SESSION_INSERT_ATTEMPTS {
            let token = token::generate_session_token().map_err(AuthError::Internal)?;
            let now = Utc::now();
            let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
                AuthError::Internal(anyhow::anyhow!("session ttl overflows the calendar"))
            })?;
            let session = Session {
                id: Uuid::new_v4(),
                credential_id: credential.id,
                token_hash: token::hash_session_token(&token),
                created_at: now,
                expires_at,
            };

            match self.store.insert_session(session).await {
                Ok(()) => {
                    self.prune_expired(credential.id).await;
                    debug!(credential_id = %credential.id, "session issued");
                    return Ok(token);
                }
                Err(StoreError::UniqueViolation) => {}
                Err(err) => return Err(err.into()),
            }
        }

        Err(AuthError::Internal(anyhow::anyhow!(
            "failed to generate unique session token"
        )))
    }

    /// Resolve a presented session token to its owner's public identity.
    ///
    /// # Errors
    /// `Unauthenticated` when no token is given, `InvalidSession` when it is
    /// malformed, unknown, or expired, `Store` on backend failure.
    #[instrument(skip_all)]
    pub async fn validate_session(&self, token: Option<&str>) -> Result<PublicIdentity, AuthError> {
        let token = required(token).ok_or(AuthError::Unauthenticated)?;
        if !token::is_well_formed(token) {
            return Err(AuthError::InvalidSession);
        }

        self.store
            .find_session_identity(&token::hash_session_token(token), Utc::now())
            .await?
            .ok_or(AuthError::InvalidSession)
    }

    /// Delete the session addressed by `token`. Unknown or malformed tokens are a no-op.
    ///
    /// # Errors
    /// Returns `Store` on backend failure.
    #[instrument(skip_all)]
    pub async fn revoke_session(&self, token: Option<&str>) -> Result<bool, AuthError> {
        let Some(token) = required(token).filter(|token| token::is_well_formed(token)) else {
            return Ok(false);
        };
        Ok(self
            .store
            .delete_session(&token::hash_session_token(token))
            .await?)
    }

    async fn prune_expired(&self, credential_id: Uuid) {
        match self
            .store
            .prune_expired_sessions(credential_id, Utc::now())
            .await
        {
            Ok(0) => {}
            Ok(removed) => debug!(%credential_id, removed, "pruned expired sessions"),
            Err(err) => warn!(%credential_id, "failed to prune expired sessions: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::store::MemoryStore;

    const NAME: &str = "John";
    const EMAIL: &str = "john@x.com";
    const PASSWORD: &str = "secret123";

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn manager_with(config: AuthConfig) -> (CredentialManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CredentialManager::new(store.clone(), config), store)
    }

    fn manager() -> (CredentialManager, Arc<MemoryStore>) {
        manager_with(AuthConfig::default())
    }

    async fn register_john(manager: &CredentialManager) -> Result<Uuid, AuthError> {
        manager
            .register(Some(NAME), Some(EMAIL), Some(&secret(PASSWORD)))
            .await
    }

    #[tokio::test]
    async fn register_stores_keyed_hash_not_plaintext() -> anyhow::Result<()> {
        let (manager, store) = manager();
        let id = register_john(&manager).await?;

        let credential = store
            .find_credential_by_email(EMAIL)
            .await?
            .ok_or_else(|| anyhow::anyhow!("credential missing"))?;
        assert_eq!(credential.id, id);
        assert_eq!(credential.name, NAME);
        assert_eq!(credential.salt.len(), SALT_LEN);
        assert_ne!(credential.password_hash, PASSWORD.as_bytes().to_vec());
        assert_eq!(
            credential.password_hash,
            hashing::hash_password(&secret(PASSWORD), &credential.salt)?
        );
        Ok(())
    }

    #[tokio::test]
    async fn same_password_gets_distinct_hashes() -> anyhow::Result<()> {
        let (manager, store) = manager();
        register_john(&manager).await?;
        manager
            .register(Some("Jane"), Some("jane@x.com"), Some(&secret(PASSWORD)))
            .await?;

        let john = store.find_credential_by_email(EMAIL).await?;
        let jane = store.find_credential_by_email("jane@x.com").await?;
        let (Some(john), Some(jane)) = (john, jane) else {
            anyhow::bail!("credentials missing");
        };
        assert_ne!(john.salt, jane.salt);
        assert_ne!(john.password_hash, jane.password_hash);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let (manager, store) = manager();
        let password = secret(PASSWORD);

        for (name, email, password) in [
            (None, Some(EMAIL), Some(&password)),
            (Some("   "), Some(EMAIL), Some(&password)),
            (Some(NAME), None, Some(&password)),
            (Some(NAME), Some(""), Some(&password)),
            (Some(NAME), Some(EMAIL), None),
        ] {
            let result = manager.register(name, email, password).await;
            assert!(matches!(result, Err(AuthError::Validation(_))), "{result:?}");
        }

        let empty = secret("");
        let result = manager.register(Some(NAME), Some(EMAIL), Some(&empty)).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
        assert_eq!(store.credential_count().await, 0);
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let (manager, _) = manager();
        let result = manager
            .register(Some(NAME), Some("not-an-email"), Some(&secret(PASSWORD)))
            .await;
        assert!(matches!(result, Err(AuthError::Validation(msg)) if msg == "Invalid email"));
    }

    #[tokio::test]
    async fn register_duplicate_email_any_case() -> anyhow::Result<()> {
        let (manager, store) = manager();
        register_john(&manager).await?;

        let result = manager
            .register(Some("Other"), Some(" JOHN@X.com "), Some(&secret("other")))
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateIdentity)));
        assert_eq!(store.credential_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_keep_one_row() {
        let (manager, store) = manager();
        let password = secret(PASSWORD);
        let (first, second) = tokio::join!(
            manager.register(Some(NAME), Some(EMAIL), Some(&password)),
            manager.register(Some(NAME), Some(EMAIL), Some(&password)),
        );
        assert_eq!(u8::from(first.is_ok()) + u8::from(second.is_ok()), 1);
        assert_eq!(store.credential_count().await, 1);
    }

    #[tokio::test]
    async fn authenticate_issues_url_safe_token() -> anyhow::Result<()> {
        let (manager, store) = manager();
        register_john(&manager).await?;

        let token = manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;
        assert_eq!(token.len(), token::TOKEN_LEN);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(store.session_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_normalizes_email() -> anyhow::Result<()> {
        let (manager, _) = manager();
        register_john(&manager).await?;
        let token = manager
            .authenticate(Some("John@X.COM"), Some(&secret(PASSWORD)))
            .await?;
        assert!(token::is_well_formed(&token));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() -> anyhow::Result<()> {
        let (manager, store) = manager();
        register_john(&manager).await?;

        let wrong = manager
            .authenticate(Some(EMAIL), Some(&secret("wrong")))
            .await
            .err()
            .map(|err| err.to_string());
        let unknown = manager
            .authenticate(Some("nobody@x.com"), Some(&secret(PASSWORD)))
            .await
            .err()
            .map(|err| err.to_string());
        assert_eq!(wrong, Some("Invalid email or password".to_string()));
        assert_eq!(wrong, unknown);
        assert_eq!(store.session_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_rejects_missing_fields() {
        let (manager, _) = manager();
        let result = manager.authenticate(None, Some(&secret(PASSWORD))).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
        let result = manager.authenticate(Some(EMAIL), None).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn concurrent_logins_yield_independent_sessions() -> anyhow::Result<()> {
        let (manager, store) = manager();
        register_john(&manager).await?;
        let password = secret(PASSWORD);

        let (first, second) = tokio::join!(
            manager.authenticate(Some(EMAIL), Some(&password)),
            manager.authenticate(Some(EMAIL), Some(&password)),
        );
        let (first, second) = (first?, second?);
        assert_ne!(first, second);
        assert_eq!(store.session_count().await, 2);

        assert_eq!(manager.validate_session(Some(&first)).await?.email, EMAIL);
        assert_eq!(manager.validate_session(Some(&second)).await?.email, EMAIL);
        Ok(())
    }

    #[tokio::test]
    async fn validate_session_returns_public_identity() -> anyhow::Result<()> {
        let (manager, _) = manager();
        let id = register_john(&manager).await?;
        let token = manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;

        let identity = manager.validate_session(Some(&token)).await?;
        assert_eq!(
            identity,
            PublicIdentity {
                id,
                name: NAME.to_string(),
                email: EMAIL.to_string(),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn validate_session_rejects_missing_and_forged_tokens() -> anyhow::Result<()> {
        let (manager, _) = manager();
        register_john(&manager).await?;
        manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;

        assert!(matches!(
            manager.validate_session(None).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            manager.validate_session(Some("  ")).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            manager.validate_session(Some("not-a-real-id")).await,
            Err(AuthError::InvalidSession)
        ));

        let forged = token::generate_session_token()?;
        assert!(matches!(
            manager.validate_session(Some(&forged)).await,
            Err(AuthError::InvalidSession)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_does_not_validate() -> anyhow::Result<()> {
        let (manager, _) = manager_with(AuthConfig::new().with_session_ttl_seconds(0));
        register_john(&manager).await?;
        let token = manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;

        assert!(matches!(
            manager.validate_session(Some(&token)).await,
            Err(AuthError::InvalidSession)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn login_with_overflowing_ttl_is_internal_error() -> anyhow::Result<()> {
        let (manager, store) =
            manager_with(AuthConfig::new().with_session_ttl_seconds(10_000_000_000_000));
        register_john(&manager).await?;

        let result = manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
        assert_eq!(store.session_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn login_prunes_expired_sessions() -> anyhow::Result<()> {
        let (expiring, store) = manager_with(AuthConfig::new().with_session_ttl_seconds(0));
        register_john(&expiring).await?;
        expiring
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;
        expiring
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;
        // Each login prunes what is already expired, including its own zero-TTL session.
        assert_eq!(store.session_count().await, 0);

        let manager = CredentialManager::new(store.clone(), AuthConfig::default());
        manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;
        assert_eq!(store.session_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn revoked_session_does_not_validate() -> anyhow::Result<()> {
        let (manager, store) = manager();
        register_john(&manager).await?;
        let token = manager
            .authenticate(Some(EMAIL), Some(&secret(PASSWORD)))
            .await?;

        assert!(manager.revoke_session(Some(&token)).await?);
        assert!(!manager.revoke_session(Some(&token)).await?);
        assert!(matches!(
            manager.validate_session(Some(&token)).await,
            Err(AuthError::InvalidSession)
        ));
        assert_eq!(store.session_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn revoke_ignores_missing_and_malformed_tokens() -> anyhow::Result<()> {
        let (manager, _) = manager();
        assert!(!manager.revoke_session(None).await?);
        assert!(!manager.revoke_session(Some("not-a-real-id")).await?);
        Ok(())
    }
}
