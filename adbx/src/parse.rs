//! Line grammars for text responses.
//!
//! Each `*_line` function matches one line and returns `None` when the line
//! does not fit its grammar. A single trailing `\r` is tolerated.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Value of a device feature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Feature {
    /// Listed without a value.
    Enabled,
    /// Listed as `name=value`.
    Value(String),
}

/// A reverse port forward.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Reverse {
    /// Device-side endpoint.
    pub remote: String,
    /// Host-side endpoint.
    pub local: String,
}

/// Strips one trailing carriage return.
fn chomp(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Matches `feature:<name>` or `feature:<name>=<value>`.
///
/// The name ends at the first `=`; the value may contain more of them.
pub fn feature_line(line: &str) -> Option<(&str, Feature)> {
    let rest = chomp(line).strip_prefix("feature:")?;
    Some(match rest.split_once('=') {
        Some((name, value)) => (name, Feature::Value(value.to_owned())),
        None => (rest, Feature::Enabled),
    })
}

/// Matches `package:<name>`.
pub fn package_line(line: &str) -> Option<&str> {
    chomp(line).strip_prefix("package:")
}

/// Matches `[<key>]: [<value>]`.
pub fn property_line(line: &str) -> Option<(&str, &str)> {
    chomp(line)
        .strip_prefix('[')?
        .strip_suffix(']')?
        .split_once("]: [")
}

/// Matches `<serial> <remote> <local>`.
///
/// Returns `Ok(None)` for blank lines and an error for any other line that
/// does not have exactly three fields.
pub fn reverse_line(line: &str) -> Result<Option<Reverse>> {
    if line.is_empty() {
        return Ok(None);
    }
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(_serial), Some(remote), Some(local), None) => Ok(Some(Reverse {
            remote: remote.to_owned(),
            local: local.to_owned(),
        })),
        _ => Err(Error::MalformedReverse {
            line: line.to_owned(),
        }),
    }
}

/// Parses `pm list features` output.
pub fn features(text: &str) -> BTreeMap<String, Feature> {
    text.split('\n')
        .filter_map(feature_line)
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

/// Parses `pm list packages` output, keeping output order.
pub fn packages(text: &str) -> Vec<String> {
    text.split('\n')
        .filter_map(package_line)
        .map(str::to_owned)
        .collect()
}

/// Parses `getprop` output.
pub fn properties(text: &str) -> BTreeMap<String, String> {
    text.split('\n')
        .filter_map(property_line)
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

/// Parses a `reverse:list-forward` response.
pub fn reverses(text: &str) -> Result<Vec<Reverse>> {
    let mut out = Vec::new();
    for line in text.split('\n') {
        if let Some(entry) = reverse_line(line)? {
            out.push(entry);
        }
    }
    Ok(out)
}
