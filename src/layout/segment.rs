//! The typed content segments produced by segmentation.

use serde::{Deserialize, Serialize};

/// What a segment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Running prose
    Text,
    /// Text inside a detected table region
    Table,
}

/// A maximal run of reading-order text classified uniformly as table or prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Text or table
    pub kind: SegmentKind,
    /// Raw line text, or the rendered table once the renderer has run
    pub content: String,
    /// Zero-based page ordinal
    pub page_index: usize,
    /// Zero-based table index within the page; `None` for text segments
    pub table_ordinal: Option<usize>,
}

impl Segment {
    /// Create a text segment.
    pub fn text(page_index: usize, content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Text,
            content: content.into(),
            page_index,
            table_ordinal: None,
        }
    }

    /// Create a table segment.
    pub fn table(page_index: usize, table_ordinal: usize, content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Table,
            content: content.into(),
            page_index,
            table_ordinal: Some(table_ordinal),
        }
    }

    /// Check if this is a table segment.
    pub fn is_table(&self) -> bool {
        self.kind == SegmentKind::Table
    }

    /// Check if this is a text segment.
    pub fn is_text(&self) -> bool {
        self.kind == SegmentKind::Text
    }
}
