//! HTTP handlers.
//!
//! Handlers stay thin: they extract the payload or session header, call the
//! [`crate::credentials::CredentialManager`] and map its result to a response.

pub mod auth;
pub mod health;
pub mod me;
pub mod root;
