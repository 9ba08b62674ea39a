//! Label derivation from object and namespace naming conventions.
//!
//! Secret objects follow a `{app}-{env}-{suffix}` naming convention and
//! namespaces follow `{env}-{team}`. The resolver strips the environment
//! and `secret`/`secrets` decorations off the object name to recover the
//! application name, and takes the namespace remainder as the component.
//! The results feed the `app.kubernetes.io/*` labels only; the object's
//! actual name is never rewritten.

use crate::errors::{Error, Result};

/// Label values derived from an object name and its namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabels {
    /// Application identifier for `app.kubernetes.io/name`
    pub app_name: String,
    /// Team or squad identifier for `app.kubernetes.io/component`
    pub component: String,
}

/// Derive descriptive labels from an object name and namespace.
///
/// The name must have at least two `-` separated segments. The namespace's
/// first segment is the environment name; the rest is the component (a
/// single-segment namespace yields an empty component).
pub fn resolve(name: &str, namespace: &str) -> Result<ResolvedLabels> {
    let segments: Vec<&str> = name.split('-').collect();
    if segments.len() < 2 {
        return Err(Error::naming(name, "expected at least two '-' separated segments"));
    }
    let last = segments[segments.len() - 1];
    let penultimate = segments[segments.len() - 2];

    let namespace_segments: Vec<&str> = namespace.split('-').collect();
    let env_name = namespace_segments[0];
    let component = namespace_segments[1..].join("-");

    let app_name = if penultimate == env_name {
        if last == "secret" || last == "secrets" {
            segments[..segments.len() - 2].join("-")
        } else {
            segments[..segments.len() - 1].join("-")
        }
    } else if last == "secret" || last == "secrets" || last == env_name {
        segments[..segments.len() - 1].join("-")
    } else {
        name.to_string()
    };

    Ok(ResolvedLabels { app_name, component })
}
