use crate::{
    api,
    cli::commands::database,
    credentials::{AuthConfig, CredentialManager, CredentialStore, MemoryStore, PgStore},
};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub store: database::Options,
    pub session_ttl_seconds: u64,
    pub frontend_origin: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be reached or prepared, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store = connect_store(&args.store).await?;
    let config = AuthConfig::new().with_session_ttl_seconds(args.session_ttl_seconds);
    let manager = CredentialManager::new(store, config);

    api::new(args.port, manager, args.frontend_origin.as_deref()).await
}

async fn connect_store(options: &database::Options) -> Result<Arc<dyn CredentialStore>> {
    match options {
        database::Options::Memory => {
            warn!("Using in-memory store: credentials and sessions are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        database::Options::Postgres {
            dsn,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(*max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .max_lifetime(Duration::from_secs(60 * 30))
                .test_before_acquire(true)
                .connect(dsn.expose_secret())
                .await
                .context("Failed to connect to database")?;

            let store = PgStore::new(pool);
            store
                .apply_schema()
                .await
                .context("Failed to apply database schema")?;
            Ok(Arc::new(store))
        }
    }
}

fn log_startup_args(args: &Args) {
    let store = match &args.store {
        database::Options::Memory => "memory".to_string(),
        database::Options::Postgres {
            dsn,
            max_connections,
        } => format!(
            "postgres {} (max {max_connections} connections)",
            redact_dsn(dsn.expose_secret())
        ),
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("store", store),
        ("session_ttl_seconds", args.session_ttl_seconds.to_string()),
        (
            "frontend_origin",
            args.frontend_origin
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} ({})\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        message.push_str(&format!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
