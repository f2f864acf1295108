//! Origin allow-list gate.
//!
//! Origins are compared canonically on scheme, host, and effective port,
//! so `http://localhost:80`, `http://localhost:80/` and `http://localhost`
//! all name the same origin. Anything that does not parse as an origin
//! never matches — the gate fails closed.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// AllowedOrigins
// ============================================================================

/// The static origin allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    canonical: Vec<String>,
}

impl AllowedOrigins {
    /// Parses allow-list entries into canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty list or an entry that does
    /// not parse as an origin.
    pub fn parse(entries: &[String]) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::config("origin allow-list must not be empty"));
        }

        let mut canonical = Vec::with_capacity(entries.len());
        for entry in entries {
            let origin = canonicalize(entry)
                .ok_or_else(|| Error::config(format!("invalid origin in allow-list: {entry}")))?;
            if !canonical.contains(&origin) {
                canonical.push(origin);
            }
        }

        Ok(Self { canonical })
    }

    /// Returns `true` if the raw origin value is allow-listed.
    ///
    /// Unparseable input never matches.
    #[must_use]
    pub fn permits(&self, origin: &str) -> bool {
        canonicalize(origin).is_some_and(|c| self.canonical.contains(&c))
    }

    /// Canonicalizes a raw origin, or `None` when it is not one.
    #[inline]
    #[must_use]
    pub fn canonicalize(origin: &str) -> Option<String> {
        canonicalize(origin)
    }

    /// The canonical allow-list entries, in configuration order.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.canonical
    }
}

/// Canonical `scheme://host:port` form of an origin.
fn canonicalize(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{}://{}:{}", url.scheme(), host, port))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(entries: &[&str]) -> AllowedOrigins {
        let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        AllowedOrigins::parse(&entries).expect("valid allow-list")
    }

    #[test]
    fn test_permits_exact_origin() {
        let gate = gate(&["http://localhost:8081"]);
        assert!(gate.permits("http://localhost:8081"));
        assert!(!gate.permits("http://localhost:8082"));
        assert!(!gate.permits("https://localhost:8081"));
    }

    #[test]
    fn test_default_ports_are_canonical() {
        let gate = gate(&["https://editor.example.com"]);
        assert!(gate.permits("https://editor.example.com:443"));
        assert!(gate.permits("https://editor.example.com/"));
        assert!(!gate.permits("http://editor.example.com"));
    }

    #[test]
    fn test_unparseable_origin_never_matches() {
        let gate = gate(&["http://localhost:8081"]);
        assert!(!gate.permits("null"));
        assert!(!gate.permits(""));
        assert!(!gate.permits("localhost:8081"));
    }

    #[test]
    fn test_host_mismatch() {
        let gate = gate(&["http://localhost:8081"]);
        assert!(!gate.permits("http://127.0.0.2:8081"));
        assert!(!gate.permits("http://evil.example:8081"));
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        assert!(AllowedOrigins::parse(&[]).is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_entry() {
        let entries = vec!["not an origin".to_string()];
        assert!(AllowedOrigins::parse(&entries).is_err());
    }

    #[test]
    fn test_entries_are_deduplicated() {
        let gate = gate(&["http://localhost:8081", "http://localhost:8081/"]);
        assert_eq!(gate.entries().len(), 1);
    }
}
