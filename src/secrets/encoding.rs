//! Value normalization for Secret manifests.
//!
//! The cluster API expects every `data` value to be base64 text, but the
//! values coming out of the backend are a mix: plain text, text someone
//! already encoded, and encoded binary blobs. [`normalize_value`] decides
//! per value which of those it is and returns the form to store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{Error, Result};

/// Anchored base64 grammar: whole 4-char groups plus an optional padded tail
fn base64_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9+/]{4})*([A-Za-z0-9+/]{3}=|[A-Za-z0-9+/]{2}==)?$")
            .expect("base64 grammar regex compilation failed")
    })
}

/// Normalize one secret value to base64 text.
///
/// A value that does not look like base64 is encoded. A value that looks
/// like base64 is decoded to inspect its content: decoded plain text (all
/// bytes ASCII) means the string is handled like any other text and encoded
/// again, while decoded binary passes through unchanged as pre-encoded data.
///
/// The key does not influence the output; it only tags decode failures,
/// which indicate a corrupt declared-base64 secret and abort the run.
pub fn normalize_value(key: &str, value: &str) -> Result<String> {
    if !base64_grammar().is_match(value) {
        return Ok(STANDARD.encode(value.as_bytes()));
    }

    let decoded = STANDARD.decode(value.as_bytes()).map_err(|err| {
        Error::value(key, format!("matches the base64 grammar but does not decode: {}", err))
    })?;

    if decoded.iter().all(|byte| byte.is_ascii()) {
        // Decodes to readable text: encode the original string like any
        // other plain value.
        Ok(STANDARD.encode(value.as_bytes()))
    } else {
        // Decodes to binary: already encoded, pass through.
        Ok(value.to_string())
    }
}
