//! Secret assembly pipeline.
//!
//! One logical group (a name plus an ordered list of backend paths) flows
//! through this module to become a complete Kubernetes Secret manifest:
//!
//! - [`assembler`] fetches and merges the key/value pairs per group
//! - [`encoding`] normalizes every value into base64 text
//! - [`naming`] derives the descriptive labels from the group name
//! - [`manifest`] models the serializable Secret object
//!
//! Fetching goes through the [`SecretFetcher`] trait so the pipeline can be
//! exercised with canned data instead of a live backend.

pub mod assembler;
pub mod encoding;
pub mod manifest;
pub mod naming;

// Re-export main types
pub use assembler::{assemble, SecretFetcher, SecretGroup};
pub use encoding::normalize_value;
pub use manifest::SecretManifest;
pub use naming::{resolve, ResolvedLabels};
