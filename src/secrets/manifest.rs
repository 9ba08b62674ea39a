//! Kubernetes Secret manifest model.
//!
//! The shape mirrors what the API server expects on create/update: a v1
//! `Secret` of type `Opaque` whose `data` values are base64 text. Built
//! fresh per group and serialized once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::naming::ResolvedLabels;

/// Label carrying the derived application name
const LABEL_APP_NAME: &str = "app.kubernetes.io/name";

/// Label carrying the derived team component
const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Label identifying the object's manager
const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// A serializable Kubernetes Secret object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub secret_type: String,
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

/// Object metadata carried on every manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

impl SecretManifest {
    /// Build an Opaque Secret named after its group, with the standard labels
    pub fn opaque(
        name: &str,
        namespace: &str,
        labels: &ResolvedLabels,
        data: BTreeMap<String, String>,
    ) -> Self {
        let mut label_map = BTreeMap::new();
        label_map.insert(LABEL_APP_NAME.to_string(), labels.app_name.clone());
        label_map.insert(LABEL_COMPONENT.to_string(), labels.component.clone());
        label_map.insert(LABEL_MANAGED_BY.to_string(), crate::APP_NAME.to_string());

        Self {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
            secret_type: "Opaque".to_string(),
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: namespace.to_string(),
                labels: label_map,
            },
            data,
        }
    }
}
