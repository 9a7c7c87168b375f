//! Input domain validation with Public Suffix List integration.
//!
//! A scan target must be a syntactically valid, registrable-or-deeper domain
//! name. The checks here run once, before any provider is contacted:
//! - scheme, path and port are stripped from URL-like input
//! - the name is trimmed, lowercased and its root dot removed
//! - every label is 1-63 chars of `[a-z0-9-]` without edge hyphens
//! - the TLD is alphabetic (or an IDN `xn--` label) and at least 2 chars
//! - a bare public suffix such as `co.uk` is refused

use std::fmt;

use psl::{domain_str, suffix_str};

use crate::errors::{Result, ScanError};

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A validated scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    name: String,
    registrable: Option<String>,
    suffix: Option<String>,
}

impl Domain {
    /// Clean and validate user input.
    pub fn parse(input: &str) -> Result<Self> {
        let clean = clean_domain_input(input)
            .ok_or_else(|| ScanError::invalid_input(input, "empty domain"))?;

        if clean.len() > MAX_DOMAIN_LEN {
            return Err(ScanError::invalid_input(
                input,
                format!("longer than {MAX_DOMAIN_LEN} characters"),
            ));
        }

        let labels: Vec<&str> = clean.split('.').collect();
        if labels.len() < 2 {
            return Err(ScanError::invalid_input(
                input,
                "expected at least two labels (e.g. example.com)",
            ));
        }
        for label in &labels {
            check_label(label).map_err(|reason| ScanError::invalid_input(input, reason))?;
        }
        if let Some(tld) = labels.last() {
            check_tld(tld).map_err(|reason| ScanError::invalid_input(input, reason))?;
        }

        let registrable = domain_str(&clean).map(str::to_string);
        let suffix = suffix_str(&clean).map(str::to_string);
        if registrable.is_none() && suffix.as_deref() == Some(clean.as_str()) {
            return Err(ScanError::invalid_input(input, "is a public suffix"));
        }

        Ok(Self {
            name: clean,
            registrable,
            suffix,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The registrable part (`example.co.uk` for `www.example.co.uk`).
    pub fn registrable(&self) -> Option<&str> {
        self.registrable.as_deref()
    }

    /// Public suffix reported by the PSL.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// True when the target is itself below its registrable domain.
    pub fn is_subdomain(&self) -> bool {
        self.registrable
            .as_deref()
            .map(|reg| reg != self.name)
            .unwrap_or(false)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Extract the host part from URL-like input, removing scheme, path and port.
pub fn extract_domain_from_url(input: &str) -> &str {
    let trimmed = input.trim();
    let without_scheme = ["http://", "https://"]
        .iter()
        .find_map(|scheme| {
            trimmed
                .get(..scheme.len())
                .filter(|head| head.eq_ignore_ascii_case(scheme))
                .map(|_| &trimmed[scheme.len()..])
        })
        .unwrap_or(trimmed);

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("");
    host.split(':').next().unwrap_or("").trim()
}

/// Clean domain input by removing common artifacts.
fn clean_domain_input(input: &str) -> Option<String> {
    let clean = extract_domain_from_url(input)
        .trim_end_matches('.')
        .to_ascii_lowercase();
    if clean.is_empty() { None } else { Some(clean) }
}

fn check_label(label: &str) -> std::result::Result<(), String> {
    if label.is_empty() {
        return Err("contains an empty label".to_string());
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(format!("label '{label}' exceeds {MAX_LABEL_LEN} characters"));
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(format!("label '{label}' contains invalid characters"));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(format!("label '{label}' starts or ends with a hyphen"));
    }
    Ok(())
}

fn check_tld(tld: &str) -> std::result::Result<(), String> {
    let idn = tld.starts_with("xn--") && tld.len() > 4;
    if idn || (tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_lowercase())) {
        Ok(())
    } else {
        Err(format!("'{tld}' is not a valid top-level domain"))
    }
}
