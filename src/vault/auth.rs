//! Authentication method selection and login payload construction.

use std::fmt;

use serde_json::{json, Value};

use crate::errors::{Error, Result};

/// Supported Vault authentication methods, selected by the second segment
/// of the auth mount path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Kubernetes,
    AppRole,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Kubernetes => "kubernetes",
            AuthMethod::AppRole => "approle",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string wrapper that redacts its contents in Debug and Display output.
///
/// Holds the service account JWT or AppRole secret id. The actual value is
/// only reachable through `expose_secret()`, so a stray `{:?}` on a config
/// struct cannot leak it into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Everything needed to perform one login: the mount path, the method it
/// selects, the role name, and the credential proving the role.
#[derive(Debug, Clone)]
pub struct AuthDescriptor {
    mount_path: String,
    method: AuthMethod,
    role: String,
    credential: Credential,
}

impl AuthDescriptor {
    /// Validates the mount path and binds it to a role and credential.
    ///
    /// The mount path must contain exactly two non-empty `/` separated
    /// segments (`auth/kubernetes`, `auth/approle`). Anything deeper or
    /// shallower is rejected before any network traffic happens.
    pub fn from_parts(
        mount_path: impl Into<String>,
        role: impl Into<String>,
        credential: Credential,
    ) -> Result<Self> {
        let mount_path = mount_path.into().trim().trim_matches('/').to_string();
        let segments: Vec<&str> =
            mount_path.split('/').map(str::trim).filter(|s| !s.is_empty()).collect();
        if segments.len() != 2 {
            return Err(Error::config(format!(
                "malformed auth path '{}': expected exactly two segments, e.g. 'auth/kubernetes'",
                mount_path
            )));
        }

        let method = match segments[1] {
            "kubernetes" => AuthMethod::Kubernetes,
            "approle" => AuthMethod::AppRole,
            other => {
                return Err(Error::config(format!(
                    "unsupported auth method '{}': expected 'kubernetes' or 'approle'",
                    other
                )))
            }
        };

        let role = role.into().trim().to_string();
        if role.is_empty() {
            return Err(Error::config("auth role must not be empty"));
        }
        if credential.is_empty() {
            return Err(Error::config("auth credential must not be empty"));
        }

        Ok(Self { mount_path: segments.join("/"), method, role, credential })
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Backend path of the login endpoint, relative to the API root.
    pub fn login_path(&self) -> String {
        format!("{}/login", self.mount_path)
    }

    /// The JSON body posted to the login endpoint.
    ///
    /// Field names differ per method: Kubernetes expects `jwt`/`role`,
    /// AppRole expects `role_id`/`secret_id`.
    pub fn login_payload(&self) -> Value {
        match self.method {
            AuthMethod::Kubernetes => json!({
                "jwt": self.credential.expose_secret(),
                "role": self.role,
            }),
            AuthMethod::AppRole => json!({
                "role_id": self.role,
                "secret_id": self.credential.expose_secret(),
            }),
        }
    }
}
