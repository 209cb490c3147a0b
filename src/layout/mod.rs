//! Page layout input and table/text segmentation.
//!
//! The upstream extractor hands us text lines per page in reading order,
//! each with a bounding box in native page units. Together with the table
//! regions found by the detector, the [`segmenter`] turns those lines into an
//! ordered stream of [`Segment`]s.

pub mod segment;
pub mod segmenter;
pub mod table_regions;
pub mod words;

pub use segment::{Segment, SegmentKind};
pub use segmenter::{segment_document, segment_page, DocumentSegments, PageSegmenter, SkippedPage};
pub use table_regions::{DetectedObject, TableRegion};
pub use words::{lines_from_words, WordBox, WordDocument, WordPage};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{BBox, PageSize};

/// One line of extracted text with its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub bottom: f64,
    /// Literal line text
    pub text: String,
}

impl TextLine {
    /// Create a line from its box and text.
    pub fn new(bbox: BBox, text: impl Into<String>) -> Self {
        Self {
            x0: bbox.x0,
            top: bbox.top,
            x1: bbox.x1,
            bottom: bbox.bottom,
            text: text.into(),
        }
    }

    /// Bounding box of the line.
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }

    /// Whether the line carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The text lines of one page plus its native size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Native page width
    pub width: f64,
    /// Native page height
    pub height: f64,
    /// Lines in reading order
    #[serde(default)]
    pub lines: Vec<TextLine>,
}

impl PageLayout {
    /// Create a page layout.
    pub fn new(size: PageSize, lines: Vec<TextLine>) -> Self {
        Self {
            width: size.width,
            height: size.height,
            lines,
        }
    }

    /// Native page size.
    pub fn size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }
}

/// All pages of a document, in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Pages; the position in this list is the page index
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Create a layout from pages.
    pub fn new(pages: Vec<PageLayout>) -> Self {
        Self { pages }
    }

    /// Load a layout JSON file written by the extraction step.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
