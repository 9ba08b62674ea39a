//! # secret-courier
//!
//! A one-shot job that syncs secrets from a Vault-compatible backend into
//! Kubernetes Secret objects. It authenticates with a pluggable method
//! (kubernetes serviceaccount JWT or approle), reads one or more logical
//! groups of key/value pairs, normalizes every value to base64, and
//! creates or updates the matching Secret in the target namespace.
//!
//! ## Flow
//!
//! ```text
//! env + mounted files → AppConfig
//!         ↓
//! health gate → login → per group: fetch → merge → encode → upsert
//! ```
//!
//! The binary is a thin wrapper; every stage lives here so it can be
//! exercised against mock HTTP servers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use secret_courier::{config::AppConfig, runner, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let summary = runner::run(&config).await?;
//!     tracing::info!(synced = summary.synced, "done");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod kubernetes;
pub mod observability;
pub mod runner;
pub mod secrets;
pub mod vault;

// Re-export commonly used types and traits
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
