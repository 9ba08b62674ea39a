//! # Error Handling
//!
//! Failure taxonomy for the sync job using `thiserror`. Every phase of a run
//! (configuration, login, fetch, encode, upsert) maps to its own variant so
//! a failed run names the group, path, or key involved without re-running
//! with extra instrumentation.

/// Custom result type for secret-courier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sync job
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or malformed env vars and mounted files)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Login or token-exchange failures against the secrets backend
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Secrets backend transport or response-shape failures
    #[error("Secrets backend error: {message}")]
    Backend { message: String },

    /// Secret read failures, scoped to the group and backend path
    #[error("Fetch error for group '{group}' at path '{path}': {message}")]
    Fetch { group: String, path: String, message: String },

    /// A secret value that violates the string/base64 contract
    #[error("Invalid value for key '{key}': {reason}")]
    Value { key: String, reason: String },

    /// A group name that cannot be parsed into labels
    #[error("Invalid object name '{name}': {reason}")]
    Naming { name: String, reason: String },

    /// Cluster API transport failures (TLS, connection, body decode)
    #[error("Kubernetes API error: {message}")]
    Kubernetes { message: String },

    /// Create or update rejected by the API server
    #[error("Upsert of secret '{name}' rejected with code {code}: {message}")]
    Upsert { name: String, code: i64, message: String },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth { message: message.into() }
    }

    /// Create a new secrets backend error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend { message: message.into() }
    }

    /// Create a fetch error scoped to a group and path
    pub fn fetch<G, P, S>(group: G, path: P, message: S) -> Self
    where
        G: Into<String>,
        P: Into<String>,
        S: Into<String>,
    {
        Self::Fetch { group: group.into(), path: path.into(), message: message.into() }
    }

    /// Create a value error scoped to a secret key
    pub fn value<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::Value { key: key.into(), reason: reason.into() }
    }

    /// Create a naming error scoped to an object name
    pub fn naming<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::Naming { name: name.into(), reason: reason.into() }
    }

    /// Create a new Kubernetes transport error
    pub fn kubernetes<S: Into<String>>(message: S) -> Self {
        Self::Kubernetes { message: message.into() }
    }

    /// Create an upsert rejection carrying the API server's status code
    pub fn upsert<N: Into<String>, S: Into<String>>(name: N, code: i64, message: S) -> Self {
        Self::Upsert { name: name.into(), code, message: message.into() }
    }
}
