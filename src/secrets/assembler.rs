//! Per-group secret assembly.
//!
//! Fetches every backend path of a group in order, merges the key/value
//! pairs with last-writer-wins semantics, enforces the string-only value
//! contract, normalizes values, and produces the manifest. A group whose
//! paths all come back empty assembles to `None` and is skipped upstream.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{Error, Result};
use crate::secrets::encoding::normalize_value;
use crate::secrets::manifest::SecretManifest;
use crate::secrets::naming::resolve;

/// One logical Secret object: a name and the backend paths merged into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretGroup {
    pub name: String,
    pub paths: Vec<String>,
}

/// Capability to read the key/value map at one backend path.
///
/// An empty map is a valid, non-error result. Implemented by the backend
/// client; tests implement it with canned data.
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Map<String, Value>>;
}

/// Assemble one group into a manifest, or `None` when it has nothing to
/// write.
///
/// Paths are fetched sequentially in declaration order; a key fetched from
/// a later path overwrites the same key from an earlier one. The first
/// fetch failure aborts the group and discards everything merged so far.
pub async fn assemble(
    group: &SecretGroup,
    namespace: &str,
    fetcher: &dyn SecretFetcher,
) -> Result<Option<SecretManifest>> {
    let mut merged: Map<String, Value> = Map::new();

    for path in &group.paths {
        let payload = fetcher.fetch(path).await.map_err(|err| {
            let message = match err {
                Error::Backend { message } => message,
                other => other.to_string(),
            };
            Error::fetch(&group.name, path, message)
        })?;

        debug!(group = %group.name, path = %path, keys = payload.len(), "Fetched secret path");
        for (key, value) in payload {
            merged.insert(key, value);
        }
    }

    if merged.is_empty() {
        return Ok(None);
    }

    let mut data = BTreeMap::new();
    for (key, value) in &merged {
        let text = value.as_str().ok_or_else(|| {
            Error::value(key, format!("expected a string value, found {}", json_type(value)))
        })?;
        data.insert(key.clone(), normalize_value(key, text)?);
    }

    let labels = resolve(&group.name, namespace)?;
    Ok(Some(SecretManifest::opaque(&group.name, namespace, &labels, data)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
