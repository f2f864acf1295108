//! Source-mapped element identity.
//!
//! Selectable elements carry a source reference in the
//! [`ATTR_SOURCE`](crate::config::ATTR_SOURCE) attribute, formatted
//! `filePath:lineNumber:col`. A reference is *not* unique to a single node:
//! a component rendered in a loop stamps the same reference on every
//! instance, so every operation that resolves a reference works on the full
//! matching set in document order.
//!
//! References are recomputed on every hover and click and never cached
//! across DOM mutations.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::config::{ATTR_CONTENT_EDITABLE, ATTR_SOURCE, ATTR_STYLE_EDITABLE};
use crate::identifiers::NodeId;
use crate::page::Page;

// ============================================================================
// Constants
// ============================================================================

/// File path reported for nodes without a parseable source attribute.
const UNKNOWN_PATH: &str = "unknown";

// ============================================================================
// SourceRef
// ============================================================================

/// A source-mapped element reference.
///
/// Identification never fails: a missing or malformed source attribute
/// yields the sentinel unknown reference, because identification runs on
/// arbitrary hover targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source file path.
    #[serde(rename = "filePath")]
    pub file_path: String,

    /// Line number within the file.
    #[serde(rename = "lineNumber")]
    pub line_number: u32,

    /// Column within the line.
    pub col: u32,

    /// Whether the host permits style edits (`None` when unannotated).
    #[serde(rename = "styleEditable")]
    pub style_editable: Option<bool>,

    /// Whether the host permits content edits (`None` when unannotated).
    #[serde(rename = "contentEditable")]
    pub content_editable: Option<bool>,
}

// ============================================================================
// Constructors
// ============================================================================

impl SourceRef {
    /// Creates a reference without editability annotations.
    #[inline]
    #[must_use]
    pub fn new(file_path: impl Into<String>, line_number: u32, col: u32) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            col,
            style_editable: None,
            content_editable: None,
        }
    }

    /// The sentinel reference for unidentifiable nodes.
    #[inline]
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_PATH, 0, 0)
    }

    /// Returns `true` if this is the sentinel unknown reference.
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.file_path == UNKNOWN_PATH && self.line_number == 0 && self.col == 0
    }
}

// ============================================================================
// Identification & Resolution
// ============================================================================

impl SourceRef {
    /// Derives the reference carried by a node.
    ///
    /// Parsing is best-effort, matching the attribute contract: an empty
    /// path segment falls back to `unknown`, unparseable line/column
    /// segments fall back to `0`. A node without the attribute (or a stale
    /// handle) yields [`SourceRef::unknown`].
    #[must_use]
    pub fn identify(page: &dyn Page, node: NodeId) -> Self {
        let Some(raw) = page.get_attribute(node, ATTR_SOURCE) else {
            return Self::unknown();
        };

        let mut parts = raw.split(':');
        let file_path = match parts.next() {
            Some("") | None => UNKNOWN_PATH.to_string(),
            Some(path) => path.to_string(),
        };
        let line_number = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let col = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

        Self {
            file_path,
            line_number,
            col,
            style_editable: flag_attribute(page, node, ATTR_STYLE_EDITABLE),
            content_editable: flag_attribute(page, node, ATTR_CONTENT_EDITABLE),
        }
    }

    /// The attribute value this reference reconstructs to.
    #[inline]
    #[must_use]
    pub fn attribute_value(&self) -> String {
        format!("{}:{}:{}", self.file_path, self.line_number, self.col)
    }

    /// The CSS selector matching every node carrying this reference.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> String {
        format!(r#"[{ATTR_SOURCE}="{}"]"#, self.attribute_value())
    }

    /// Resolves this reference to the full set of live nodes carrying it,
    /// in document order. The set may be empty: the DOM may have changed
    /// since the reference was derived, and a miss is never an error.
    #[must_use]
    pub fn resolve(&self, page: &dyn Page) -> Vec<NodeId> {
        page.query_selector_all(&self.selector())
    }
}

/// Reads an editability flag attribute: absent → `None`, literal `"false"`
/// → `Some(false)`, anything else (including the empty string) → `Some(true)`.
fn flag_attribute(page: &dyn Page, node: NodeId, name: &str) -> Option<bool> {
    page.get_attribute(node, name).map(|v| v != "false")
}

// ============================================================================
// Tests
// ============================================================================
