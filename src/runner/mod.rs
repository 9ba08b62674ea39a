//! End-to-end sync driver.
//!
//! Ties the pieces together for one run: wait for the backend to become
//! ready, log in, assemble and write every configured group in order, then
//! drop the session token. The first failing group aborts the run; groups
//! that assemble to nothing are skipped and counted.

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::kubernetes::KubeClient;
use crate::secrets::assemble;
use crate::vault::{VaultClient, VaultFetcher};

/// Core v1 collection the manifests are written to.
const SECRETS_COLLECTION: &str = "secrets";

/// Outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    /// Groups written to the cluster.
    pub synced: usize,
    /// Groups skipped because they assembled to no data.
    pub skipped: usize,
}

/// Runs one full sync.
pub async fn run(config: &AppConfig) -> Result<SyncSummary> {
    // Both clients are built from config alone, before any network call,
    // so bad CA material surfaces without touching either server.
    let vault = VaultClient::new(&config.vault.address, config.vault.namespace.clone())?;
    let kube = KubeClient::new(
        &config.kubernetes.api_url,
        config.kubernetes.token.expose_secret(),
        config.kubernetes.ca_pem.as_deref().map(str::as_bytes),
    )?;

    vault.wait_until_ready().await;
    let token = vault.login(&config.vault.auth).await?;
    info!(
        method = %config.vault.auth.method(),
        mount = config.vault.auth.mount_path(),
        "Authenticated to the secrets backend"
    );

    let fetcher = VaultFetcher::new(&vault, &token, config.vault.secret_root.clone());

    let result = sync_groups(config, &kube, &fetcher).await;

    // The token is short-lived either way; revocation just tightens the
    // window, so a failure here only warrants a warning.
    if let Err(err) = vault.revoke_token(&token).await {
        warn!(error = %err, "Failed to revoke session token");
    }
    result
}

async fn sync_groups(
    config: &AppConfig,
    kube: &KubeClient,
    fetcher: &VaultFetcher<'_>,
) -> Result<SyncSummary> {
    let namespace = &config.kubernetes.namespace;
    let mut summary = SyncSummary::default();

    for group in &config.groups {
        let manifest = match assemble(group, namespace, fetcher).await? {
            Some(manifest) => manifest,
            None => {
                info!(group = %group.name, "Group has no data; nothing to write");
                summary.skipped += 1;
                continue;
            }
        };

        let status = kube.probe(namespace, SECRETS_COLLECTION, &manifest.metadata.name).await?;
        let action =
            kube.upsert(&manifest, SECRETS_COLLECTION, status == StatusCode::OK).await?;
        info!(
            group = %group.name,
            action = action.as_str(),
            keys = manifest.data.len(),
            "Secret written"
        );
        summary.synced += 1;
    }

    info!(synced = summary.synced, skipped = summary.skipped, "Sync complete");
    Ok(summary)
}
