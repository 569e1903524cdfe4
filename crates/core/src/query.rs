//! Query parsing and address resolution
//!
//! Queries have the form `zenodo://{record|deposition}/<id>/<path>`.
//! Validation is purely syntactic and accepts unresolved wildcards such as
//! `{sample}`, since those are substituted before the object is used.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Scheme every query must carry
pub const SCHEME: &str = "zenodo";

/// Kind of item a query points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Published, read-only record
    Record,
    /// Unpublished deposition that still accepts uploads
    Deposition,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Record => "record",
            ItemKind::Deposition => "deposition",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ItemKind::Record)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "record" => Ok(ItemKind::Record),
            "deposition" => Ok(ItemKind::Deposition),
            _ => Err(format!("Invalid item type: {s}")),
        }
    }
}

/// Outcome of [`validate_query`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryValidation {
    pub query: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QueryValidation {
    fn valid(query: &str) -> Self {
        Self {
            query: query.to_string(),
            valid: true,
            reason: None,
        }
    }

    fn invalid(query: &str, reason: &str) -> Self {
        Self {
            query: query.to_string(),
            valid: false,
            reason: Some(reason.to_string()),
        }
    }

    /// Convert into a `Result`, carrying the reason on failure
    pub fn into_result(self) -> Result<()> {
        match self.reason {
            Some(reason) if !self.valid => Err(Error::InvalidQuery(reason)),
            _ => Ok(()),
        }
    }
}

/// Split `scheme://netloc/path` into its parts; path keeps its leading slash
fn split_query(query: &str) -> (&str, &str, &str) {
    let Some((scheme, rest)) = query.split_once("://") else {
        return ("", "", query);
    };
    match rest.find('/') {
        Some(idx) => (scheme, &rest[..idx], &rest[idx..]),
        None => (scheme, rest, ""),
    }
}

/// Check a query string, stopping at the first failing rule
pub fn validate_query(query: &str) -> QueryValidation {
    let (scheme, netloc, path) = split_query(query);

    if scheme != SCHEME {
        return QueryValidation::invalid(query, "Invalid scheme. Expected 'zenodo'.");
    }
    if netloc.parse::<ItemKind>().is_err() {
        return QueryValidation::invalid(
            query,
            "Invalid item type. Expected 'record' or 'deposition'.",
        );
    }
    if path.is_empty() {
        return QueryValidation::invalid(query, "No file path given.");
    }
    if !starts_with_record_id(path) {
        return QueryValidation::invalid(
            query,
            "Invalid record ID. Expected a number, to occur directly after record/ or deposition/.",
        );
    }
    QueryValidation::valid(query)
}

/// `/<digits>/...`
fn starts_with_record_id(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    match rest.split_once('/') {
        Some((id, _)) => !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Collapse empty and `.` segments into a relative POSIX path
pub fn normalize_posix(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// A resolved query: which item, which record, which file inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub kind: ItemKind,
    pub record_id: String,
    pub path: String,
}

impl Address {
    /// Resolve a query into an address
    ///
    /// Fails with [`Error::InvalidQuery`] when validation fails and with
    /// [`Error::Config`] when no file path remains after the record id.
    pub fn parse(query: &str) -> Result<Self> {
        validate_query(query).into_result()?;

        let (_, netloc, path) = split_query(query);
        let kind = netloc.parse::<ItemKind>().map_err(Error::InvalidQuery)?;
        let trimmed = path.trim_start_matches('/');
        let (record_id, remainder) = trimmed
            .split_once('/')
            .ok_or_else(|| Error::Config(format!("No path below record id in {query}")))?;

        let path = normalize_posix(remainder);
        if path.is_empty() {
            return Err(Error::Config(format!(
                "Path of {query} is not relative to record {record_id}"
            )));
        }

        Ok(Self {
            kind,
            record_id: record_id.to_string(),
            path,
        })
    }

    pub fn is_published(&self) -> bool {
        self.kind.is_published()
    }

    /// Local path suffix unique to this address
    pub fn local_suffix(&self) -> String {
        format!("{}/{}/{}", self.kind, self.record_id, self.path)
    }

    /// Inventory key of the enclosing record or deposition
    pub fn parent_cache_key(&self) -> String {
        format!("{SCHEME}://{}/{}", self.kind, self.record_id)
    }

    /// Inventory key of a named file within the same record
    pub fn file_cache_key(&self, name: &str) -> String {
        format!("{}/{name}", self.parent_cache_key())
    }

    /// Inventory key of this address
    pub fn cache_key(&self) -> String {
        self.file_cache_key(&self.path)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}
