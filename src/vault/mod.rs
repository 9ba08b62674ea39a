//! HTTP client for the Vault API.
//!
//! Covers the four calls the sync needs: the unauthenticated health probe,
//! login against a configured auth mount, KV version 2 reads, and a
//! best-effort token revocation at the end of the run. Error responses are
//! recognized both by status code and by the `errors` array Vault embeds
//! in response bodies.

pub mod auth;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::secrets::SecretFetcher;

pub use auth::{AuthDescriptor, AuthMethod, Credential};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";
const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Client for one Vault server, optionally scoped to an enterprise
/// namespace.
pub struct VaultClient {
    http: Client,
    base_url: String,
    namespace: Option<String>,
}

impl VaultClient {
    pub fn new(address: &str, namespace: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|err| Error::backend(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self { http, base_url: address.trim_end_matches('/').to_string(), namespace })
    }

    /// Polls the health endpoint until Vault reports initialized and
    /// unsealed (status 200). Every other status, including 429 for a
    /// standby node, and every connection error lead to another poll one
    /// second later. Does not return until Vault is ready.
    pub async fn wait_until_ready(&self) {
        let url = self.api_url("sys/health");
        loop {
            match self.with_namespace(self.http.get(&url)).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    info!("Vault is initialized and unsealed");
                    return;
                }
                Ok(response) => {
                    info!(status = response.status().as_u16(), "Vault is not ready; retrying");
                }
                Err(err) => {
                    info!(error = %err, "Vault is unreachable; retrying");
                }
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Logs in through the descriptor's auth mount and returns the client
    /// token issued for the session.
    pub async fn login(&self, auth: &AuthDescriptor) -> Result<String> {
        let url = self.api_url(&auth.login_path());
        debug!(method = %auth.method(), url = %url, "Requesting Vault token");

        let request = self.with_namespace(self.http.post(&url)).json(&auth.login_payload());
        let response = request
            .send()
            .await
            .map_err(|err| Error::auth(format!("login request failed: {}", err)))?;
        let body = read_api_body(response)
            .await
            .map_err(|message| Error::auth(format!("login rejected: {}", message)))?;

        body.get("auth")
            .and_then(|auth| auth.get("client_token"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::auth("login response carried no client token"))
    }

    /// Reads the KV version 2 secret at `path` (relative to the API root)
    /// and returns its key/value pairs. A secret without pairs reads as an
    /// empty map; a response missing the nested `data.data` envelope is a
    /// backend error.
    pub async fn read_secret(&self, token: &str, path: &str) -> Result<Map<String, Value>> {
        let url = self.api_url(path);
        debug!(url = %url, "Reading secret");

        let response = self
            .authed(self.http.get(&url), token)
            .send()
            .await
            .map_err(|err| Error::backend(format!("read request failed: {}", err)))?;
        let body = read_api_body(response).await.map_err(Error::backend)?;

        // KV v2 nests the pairs under data.data.
        match body.get("data").and_then(|outer| outer.get("data")) {
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(Value::Null) | None => Err(Error::backend(format!(
                "secret at '{}' has no key/value data in the response",
                path
            ))),
            Some(_) => {
                Err(Error::backend(format!("secret at '{}' is not a key/value object", path)))
            }
        }
    }

    /// Revokes the session token. Callers treat failures as non-fatal.
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        let url = self.api_url("auth/token/revoke-self");
        debug!(url = %url, "Revoking session token");

        let response = self
            .authed(self.http.post(&url), token)
            .send()
            .await
            .map_err(|err| Error::backend(format!("revoke request failed: {}", err)))?;
        if !response.status().is_success() {
            return Err(Error::backend(format!(
                "revoke rejected with status {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_matches('/'))
    }

    fn with_namespace(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.namespace {
            Some(namespace) => request.header(VAULT_NAMESPACE_HEADER, namespace),
            None => request,
        }
    }

    fn authed(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        self.with_namespace(request.header(VAULT_TOKEN_HEADER, token))
    }
}

/// Parses a Vault response body and folds API-level failures into an error
/// message. Vault reports failures with an `errors` array, usually paired
/// with a non-2xx status; a 404 on a missing secret carries an empty array.
async fn read_api_body(response: Response) -> std::result::Result<Value, String> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| format!("status {}: invalid JSON response: {}", status.as_u16(), err))?;

    if !status.is_success() || body.get("errors").is_some() {
        return Err(api_error_message(status, &body));
    }
    Ok(body)
}

fn api_error_message(status: StatusCode, body: &Value) -> String {
    let detail = body
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| errors.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; "))
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| "no error detail in response".to_string());
    format!("status {}: {}", status.as_u16(), detail)
}

/// A logged-in view over the client: the session token plus the KV root
/// under which group paths are resolved. This is what the assembler fetches
/// through.
pub struct VaultFetcher<'a> {
    client: &'a VaultClient,
    token: &'a str,
    secret_root: String,
}

impl<'a> VaultFetcher<'a> {
    pub fn new(client: &'a VaultClient, token: &'a str, secret_root: impl Into<String>) -> Self {
        let secret_root = secret_root.into().trim_matches('/').to_string();
        Self { client, token, secret_root }
    }

    fn full_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if self.secret_root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.secret_root, path)
        }
    }
}

#[async_trait]
impl SecretFetcher for VaultFetcher<'_> {
    async fn fetch(&self, path: &str) -> Result<Map<String, Value>> {
        self.client.read_secret(self.token, &self.full_path(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_under_v1() {
        let client = VaultClient::new("http://vault:8200/", None).unwrap();
        assert_eq!(client.api_url("sys/health"), "http://vault:8200/v1/sys/health");
        assert_eq!(client.api_url("/auth/kubernetes/login"), "http://vault:8200/v1/auth/kubernetes/login");
    }

    #[test]
    fn fetcher_joins_paths_under_the_secret_root() {
        let client = VaultClient::new("http://vault:8200", None).unwrap();
        let fetcher = VaultFetcher::new(&client, "t", "secret/data/sit-sre/");

        assert_eq!(fetcher.full_path("service"), "secret/data/sit-sre/service");
        assert_eq!(fetcher.full_path("/common/"), "secret/data/sit-sre/common");
    }

    #[test]
    fn fetcher_tolerates_an_empty_root() {
        let client = VaultClient::new("http://vault:8200", None).unwrap();
        let fetcher = VaultFetcher::new(&client, "t", "");

        assert_eq!(fetcher.full_path("service"), "service");
    }

    #[test]
    fn error_message_joins_the_errors_array() {
        let body = serde_json::json!({"errors": ["permission denied", "try again"]});
        let message = api_error_message(StatusCode::FORBIDDEN, &body);
        assert_eq!(message, "status 403: permission denied; try again");
    }

    #[test]
    fn error_message_survives_an_empty_errors_array() {
        let body = serde_json::json!({"errors": []});
        let message = api_error_message(StatusCode::NOT_FOUND, &body);
        assert_eq!(message, "status 404: no error detail in response");
    }
}
