//! HTTP client for the cluster API server.
//!
//! Talks directly to the core v1 endpoints with the mounted service
//! account identity. The only operations needed are an existence probe on
//! a named object and the create-or-replace write that follows it.

use std::time::Duration;

use reqwest::{header, Certificate, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::errors::{Error, Result};
use crate::secrets::SecretManifest;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// How an upsert landed on the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

impl UpsertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertAction::Created => "created",
            UpsertAction::Updated => "updated",
        }
    }
}

/// Client for one API server, authenticated as the mounted service
/// account.
pub struct KubeClient {
    http: Client,
    base_url: String,
    token: String,
}

impl KubeClient {
    /// Builds a client for the API server at `base_url`, trusting the
    /// given CA bundle for its serving certificate. `ca_pem` is the
    /// mounted `ca.crt`; in-process tests against a plain HTTP server
    /// pass `None`.
    pub fn new(base_url: &str, token: impl Into<String>, ca_pem: Option<&[u8]>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION));
        if let Some(pem) = ca_pem {
            let certificate = Certificate::from_pem(pem).map_err(|err| {
                Error::kubernetes(format!("invalid cluster CA certificate: {}", err))
            })?;
            builder = builder.add_root_certificate(certificate);
        }
        let http = builder
            .build()
            .map_err(|err| Error::kubernetes(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), token: token.into() })
    }

    /// Checks whether the named object already exists and returns the raw
    /// probe status. Only 200 means it does.
    pub async fn probe(&self, namespace: &str, collection: &str, name: &str) -> Result<StatusCode> {
        let url = format!("{}/{}", self.collection_url(namespace, collection), name);
        debug!(url = %url, "Probing for existing object");

        let response = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(|err| Error::kubernetes(format!("probe request failed: {}", err)))?;
        Ok(response.status())
    }

    /// Writes the manifest: a replace (PUT on the named resource) when the
    /// probe found it, a create (POST on the collection) otherwise. The
    /// API reports rejection as a Status body carrying a `code`, which is
    /// surfaced as an upsert error.
    pub async fn upsert(
        &self,
        manifest: &SecretManifest,
        collection: &str,
        exists: bool,
    ) -> Result<UpsertAction> {
        let collection_url = self.collection_url(&manifest.metadata.namespace, collection);
        let (request, action) = if exists {
            let url = format!("{}/{}", collection_url, manifest.metadata.name);
            (self.http.put(&url), UpsertAction::Updated)
        } else {
            (self.http.post(&collection_url), UpsertAction::Created)
        };
        debug!(name = %manifest.metadata.name, action = action.as_str(), "Writing secret object");

        let response = self
            .request(request)
            .json(manifest)
            .send()
            .await
            .map_err(|err| Error::kubernetes(format!("write request failed: {}", err)))?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| Error::kubernetes(format!("invalid JSON response: {}", err)))?;

        if let Some(code) = body.get("code").and_then(Value::as_i64) {
            let message =
                body.get("message").and_then(Value::as_str).unwrap_or("no message").to_string();
            return Err(Error::upsert(&manifest.metadata.name, code, message));
        }
        Ok(action)
    }

    fn collection_url(&self, namespace: &str, collection: &str) -> String {
        format!("{}/api/v1/namespaces/{}/{}", self.base_url, namespace, collection)
    }

    fn request(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::ACCEPT, "application/json").bearer_auth(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_url_follows_the_core_v1_layout() {
        let client = KubeClient::new("https://10.0.0.1:443/", "token", None).unwrap();
        assert_eq!(
            client.collection_url("sit-sre", "secrets"),
            "https://10.0.0.1:443/api/v1/namespaces/sit-sre/secrets"
        );
    }

    #[test]
    fn actions_render_for_logging() {
        assert_eq!(UpsertAction::Created.as_str(), "created");
        assert_eq!(UpsertAction::Updated.as_str(), "updated");
    }
}
