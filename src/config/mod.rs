//! Runtime configuration.
//!
//! Everything the sync needs is resolved once, up front, from environment
//! variables and the mounted credential files. An incomplete environment
//! fails here with a configuration error; no network traffic happens
//! before this step has produced a full [`AppConfig`].

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use url::Url;

use crate::errors::{Error, Result};
use crate::secrets::SecretGroup;
use crate::vault::{AuthDescriptor, Credential};

/// Vault server address, e.g. `https://vault.example.com:8200`.
pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";

/// Optional Vault enterprise namespace.
pub const ENV_VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";

/// Auth mount path with exactly two segments, e.g. `auth/kubernetes`.
pub const ENV_VAULT_AUTH_PATH: &str = "VAULT_AUTH_PATH";

/// Role presented at login: the Kubernetes auth role name, or the AppRole
/// role id.
pub const ENV_APPROLE_NAME: &str = "APPROLE_NAME";

/// KV root (including the mount and `data` segment for KV version 2)
/// under which all group paths are resolved.
pub const ENV_VAULT_SECRET_PATH: &str = "VAULT_SECRET_PATH";

/// JSON object mapping Secret names to arrays of backend paths.
pub const ENV_SECRET_OBJECT: &str = "SECRET_OBJECT";

/// API server host, injected by the cluster into every pod.
pub const ENV_KUBERNETES_HOST: &str = "KUBERNETES_SERVICE_HOST";

/// Override for the service account mount directory. For tests.
pub const ENV_SERVICEACCOUNT_ROOT: &str = "COURIER_SERVICEACCOUNT_ROOT";

/// Override for the Vault credential mount directory. For tests.
pub const ENV_CREDENTIAL_ROOT: &str = "COURIER_CREDENTIAL_ROOT";

const DEFAULT_SERVICEACCOUNT_ROOT: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const DEFAULT_CREDENTIAL_ROOT: &str = "/etc/vault/secret/data";

/// Connection and session settings for the secrets backend.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub address: String,
    pub namespace: Option<String>,
    pub auth: AuthDescriptor,
    pub secret_root: String,
}

/// Identity and target for the cluster API.
#[derive(Debug, Clone)]
pub struct KubernetesSettings {
    pub api_url: String,
    pub token: Credential,
    /// Namespace written to, read from the service account mount.
    pub namespace: String,
    /// CA bundle for the API server certificate. Tests against a plain
    /// HTTP server leave this unset.
    pub ca_pem: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub vault: VaultSettings,
    pub kubernetes: KubernetesSettings,
    pub groups: Vec<SecretGroup>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let address = required_env(ENV_VAULT_ADDR)?;
        Url::parse(&address).map_err(|err| {
            Error::config(format!("{} is not a valid URL: {}", ENV_VAULT_ADDR, err))
        })?;

        let namespace = optional_env(ENV_VAULT_NAMESPACE);
        let secret_root = required_env(ENV_VAULT_SECRET_PATH)?;
        let groups = parse_groups(&required_env(ENV_SECRET_OBJECT)?)?;

        let credential_root = env_or(ENV_CREDENTIAL_ROOT, DEFAULT_CREDENTIAL_ROOT);
        let credential = Credential::new(read_trimmed(Path::new(&credential_root).join("token"))?);
        let auth = AuthDescriptor::from_parts(
            required_env(ENV_VAULT_AUTH_PATH)?,
            required_env(ENV_APPROLE_NAME)?,
            credential,
        )?;

        let sa_root = env_or(ENV_SERVICEACCOUNT_ROOT, DEFAULT_SERVICEACCOUNT_ROOT);
        let sa_root = Path::new(&sa_root);
        let token = Credential::new(read_trimmed(sa_root.join("token"))?);
        if token.is_empty() {
            return Err(Error::config("service account token file is empty"));
        }
        let target_namespace = read_trimmed(sa_root.join("namespace"))?;
        if target_namespace.is_empty() {
            return Err(Error::config("service account namespace file is empty"));
        }
        let ca_pem = read_trimmed(sa_root.join("ca.crt"))?;

        let host = required_env(ENV_KUBERNETES_HOST)?;

        Ok(Self {
            vault: VaultSettings { address, namespace, auth, secret_root },
            kubernetes: KubernetesSettings {
                api_url: format!("https://{}", host),
                token,
                namespace: target_namespace,
                ca_pem: Some(ca_pem),
            },
            groups,
        })
    }
}

// Deserializes the SECRET_OBJECT document without losing the declaration
// order of the object, which serde_json's default map representation
// would.
struct GroupList(Vec<SecretGroup>);

impl<'de> Deserialize<'de> for GroupList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupMapVisitor;

        impl<'de> Visitor<'de> for GroupMapVisitor {
            type Value = GroupList;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of group names to arrays of backend paths")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups = Vec::new();
                while let Some((name, paths)) = access.next_entry::<String, Vec<String>>()? {
                    groups.push(SecretGroup { name, paths });
                }
                Ok(GroupList(groups))
            }
        }

        deserializer.deserialize_map(GroupMapVisitor)
    }
}

/// Parses the `SECRET_OBJECT` JSON document into groups, preserving the
/// declaration order of the object. Names and paths are trimmed. Every
/// group needs at least one non-empty path, and names must be unique; an
/// empty document (`{}`) is valid and yields no groups.
pub fn parse_groups(raw: &str) -> Result<Vec<SecretGroup>> {
    let GroupList(parsed) = serde_json::from_str(raw).map_err(|err| {
        Error::config(format!("invalid {} document: {}", ENV_SECRET_OBJECT, err))
    })?;

    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(parsed.len());
    for group in parsed {
        let name = group.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::config(format!(
                "{} contains a group with an empty name",
                ENV_SECRET_OBJECT
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(Error::config(format!(
                "{} declares group '{}' more than once",
                ENV_SECRET_OBJECT, name
            )));
        }
        let paths: Vec<String> = group
            .paths
            .iter()
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .collect();
        if paths.is_empty() {
            return Err(Error::config(format!("group '{}' has no backend paths", name)));
        }
        groups.push(SecretGroup { name, paths });
    }
    Ok(groups)
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::config(format!("{} must be set", name))),
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|value| value.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_string())
}

fn read_trimmed(path: PathBuf) -> Result<String> {
    fs::read_to_string(&path)
        .map(|contents| contents.trim().to_string())
        .map_err(|err| Error::config(format!("failed to read '{}': {}", path.display(), err)))
}
