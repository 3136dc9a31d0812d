//! Route table: prefix → handler set.
//!
//! # Responsibilities
//! - Hold the four top-level entries (root, docs, auth, jobs)
//! - Record which entries sit behind the authentication guard
//! - Reject tables whose prefixes overlap
//! - Resolve a path to its entry or an explicit no-match
//!
//! Built once at startup and shared read-only afterwards.

use crate::routing::matcher::{ExactPathMatcher, Matcher, PathPrefixMatcher};

/// Handler set selected by a route entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// Static informational page at `/`.
    Root,
    /// API documentation UI and document.
    Docs,
    /// Credential issuance (register, login).
    Auth,
    /// Jobs resource.
    Jobs,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Root => "root",
            RouteKind::Docs => "docs",
            RouteKind::Auth => "auth",
            RouteKind::Jobs => "jobs",
        }
    }
}

/// One top-level entry of the route table.
#[derive(Debug)]
pub struct RouteEntry {
    pub kind: RouteKind,
    pub prefix: String,
    pub requires_auth: bool,
    matcher: Box<dyn Matcher>,
}

impl RouteEntry {
    fn exact(kind: RouteKind, path: &str) -> Self {
        Self {
            kind,
            prefix: path.to_string(),
            requires_auth: false,
            matcher: Box::new(ExactPathMatcher::new(path)),
        }
    }

    fn prefixed(kind: RouteKind, prefix: &str, requires_auth: bool) -> Self {
        let matcher = PathPrefixMatcher::new(prefix);
        Self {
            kind,
            prefix: matcher.prefix().to_string(),
            requires_auth,
            matcher: Box::new(matcher),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

/// Errors building a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("prefix {0:?} must start with '/' and name at least one segment")]
    InvalidPrefix(String),

    #[error("prefixes {0:?} and {1:?} overlap")]
    Overlap(String, String),
}

/// Static mapping of URL prefixes to handler sets.
#[derive(Debug)]
pub struct RouteTable {
    api_prefix: String,
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build the standard table for an API prefix (e.g. `/api/v1`) and a
    /// documentation path (e.g. `/api-docs`).
    pub fn new(api_prefix: &str, docs_path: &str) -> Result<Self, RouteTableError> {
        let api_prefix = normalize_prefix(api_prefix)?;
        let docs_path = normalize_prefix(docs_path)?;

        let entries = vec![
            RouteEntry::exact(RouteKind::Root, "/"),
            RouteEntry::prefixed(RouteKind::Docs, &docs_path, false),
            RouteEntry::prefixed(RouteKind::Auth, &format!("{api_prefix}/auth"), false),
            RouteEntry::prefixed(RouteKind::Jobs, &format!("{api_prefix}/jobs"), true),
        ];

        let prefixed: Vec<&RouteEntry> = entries
            .iter()
            .filter(|e| e.kind != RouteKind::Root)
            .collect();
        for (i, a) in prefixed.iter().enumerate() {
            for b in &prefixed[i + 1..] {
                if a.matches(&b.prefix) || b.matches(&a.prefix) {
                    return Err(RouteTableError::Overlap(a.prefix.clone(), b.prefix.clone()));
                }
            }
        }

        Ok(Self {
            api_prefix,
            entries,
        })
    }

    /// Normalized API prefix shared by the auth and jobs entries.
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Prefix registered for `kind`.
    pub fn prefix_of(&self, kind: RouteKind) -> &str {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.prefix.as_str())
            .unwrap_or("/")
    }
}

fn normalize_prefix(prefix: &str) -> Result<String, RouteTableError> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') || trimmed.len() < 2 || trimmed.contains("//") {
        return Err(RouteTableError::InvalidPrefix(prefix.to_string()));
    }
    Ok(trimmed.to_string())
}
