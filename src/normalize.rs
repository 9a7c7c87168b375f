//! Hostname normalization.
//!
//! Providers emit hostnames in whatever shape their data source uses:
//! wildcard certificate names (`*.example.com`), mixed case, trailing root
//! dots, stray whitespace. `normalize` turns one such candidate into a
//! canonical `SubdomainRecord` or rejects it.
//!
//! Splitting multi-value fields (crt.sh `name_value`, CSV lines) happens in
//! the adapters; this stage always receives a single candidate.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum length of a single DNS label.
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a full hostname (without the root dot).
const MAX_HOSTNAME_LEN: usize = 253;

/// Canonical, lowercase, wildcard-free hostname with at least two labels.
///
/// Only `normalize` constructs records, so every value upholds those
/// invariants. Ordering is the byte order of the underlying string.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SubdomainRecord(String);

impl SubdomainRecord {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Labels left of `domain`, or `None` when the record is not under it.
    pub fn label_under(&self, domain: &str) -> Option<&str> {
        self.0
            .strip_suffix(domain)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .filter(|prefix| !prefix.is_empty())
    }
}

impl fmt::Display for SubdomainRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SubdomainRecord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize one raw hostname candidate.
///
/// Returns `None` for candidates that are empty, have a single label, or
/// contain characters that cannot appear in a hostname (e-mail addresses
/// and free text in certificate subjects end up here).
pub fn normalize(raw: &str) -> Option<SubdomainRecord> {
    let lowered = raw.trim().to_ascii_lowercase();
    let stripped = strip_wildcards(&lowered);
    let host = stripped.trim_end_matches('.').trim_start_matches('.');

    if host.is_empty() || !host.contains('.') {
        return None;
    }
    if !is_hostname(host) {
        return None;
    }
    Some(SubdomainRecord(host.to_string()))
}

/// Remove every `*.` marker that prefixes a label.
fn strip_wildcards(host: &str) -> String {
    host.split('.')
        .filter(|label| *label != "*")
        .collect::<Vec<_>>()
        .join(".")
}

/// Character and length check applied after wildcard stripping.
fn is_hostname(host: &str) -> bool {
    if host.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && label
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
    })
}
