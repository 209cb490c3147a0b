//! Line-walk segmentation of a page into text and table segments.
//!
//! The walk is a small state machine. The state is the kind of text being
//! accumulated (prose, or table number `n`) plus the buffer. Every line is
//! classified against the page's table regions; a change of classification
//! or a blank line flushes the buffer as a [`Segment`]. Entering a table from
//! prose assigns the next table ordinal of the page.

use serde::Serialize;

use crate::artifacts::ArtifactLayout;
use crate::error::Error;
use crate::geometry::DpiScale;
use crate::layout::table_regions::{load_detected_objects, regions_from_objects, TableRegion};
use crate::layout::{DocumentLayout, PageLayout, Segment, SegmentKind, TextLine};

/// What the walk is currently accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Table { ordinal: usize },
}

impl Mode {
    fn kind(self) -> SegmentKind {
        match self {
            Mode::Text => SegmentKind::Text,
            Mode::Table { .. } => SegmentKind::Table,
        }
    }
}

/// Accumulator state threaded through the line walk of one page.
#[derive(Debug)]
struct Walk {
    page_index: usize,
    mode: Mode,
    buffer: String,
    tables_entered: usize,
}

impl Walk {
    fn new(page_index: usize) -> Self {
        Self {
            page_index,
            mode: Mode::Text,
            buffer: String::new(),
            tables_entered: 0,
        }
    }

    /// Emit the buffer as a segment of the current mode, if it holds anything.
    fn flush(&mut self) -> Option<Segment> {
        if self.buffer.is_empty() {
            return None;
        }
        let content = std::mem::take(&mut self.buffer);
        Some(match self.mode {
            Mode::Text => Segment::text(self.page_index, content),
            Mode::Table { ordinal } => Segment::table(self.page_index, ordinal, content),
        })
    }

    /// Consume one classified line.
    fn step(&mut self, line: &TextLine, kind: SegmentKind) -> Option<Segment> {
        let emitted = if kind != self.mode.kind() || line.is_blank() {
            self.flush()
        } else {
            None
        };

        self.mode = match (self.mode, kind) {
            (Mode::Table { ordinal }, SegmentKind::Table) => Mode::Table { ordinal },
            (Mode::Text, SegmentKind::Table) => {
                let ordinal = self.tables_entered;
                self.tables_entered += 1;
                Mode::Table { ordinal }
            },
            (_, SegmentKind::Text) => Mode::Text,
        };

        // blank lines still contribute their separator
        self.buffer.push_str(&line.text);
        self.buffer.push(' ');

        emitted
    }
}

/// Classifies and groups the lines of a single page.
#[derive(Debug, Clone, Copy)]
pub struct PageSegmenter<'a> {
    page_index: usize,
    regions: &'a [TableRegion],
}

impl<'a> PageSegmenter<'a> {
    /// Create a segmenter for a page and its native-space table regions.
    pub fn new(page_index: usize, regions: &'a [TableRegion]) -> Self {
        Self {
            page_index,
            regions,
        }
    }

    /// Table if the line sits entirely inside any region, text otherwise.
    pub fn classify(&self, line: &TextLine) -> SegmentKind {
        let bbox = line.bbox();
        if self.regions.iter().any(|region| region.contains(&bbox)) {
            SegmentKind::Table
        } else {
            SegmentKind::Text
        }
    }

    /// Walk the lines in order and return the page's segments.
    ///
    /// A page without table regions yields no segments at all.
    pub fn segment(&self, lines: &[TextLine]) -> Vec<Segment> {
        if self.regions.is_empty() {
            return Vec::new();
        }

        let mut walk = Walk::new(self.page_index);
        let mut segments: Vec<Segment> = lines
            .iter()
            .filter_map(|line| walk.step(line, self.classify(line)))
            .collect();
        segments.extend(walk.flush());
        segments
    }
}

/// Segment one page against already rescaled table regions.
pub fn segment_page(page_index: usize, page: &PageLayout, regions: &[TableRegion]) -> Vec<Segment> {
    PageSegmenter::new(page_index, regions).segment(&page.lines)
}

/// A page that produced no segments, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPage {
    /// Zero-based page index
    pub page_index: usize,
    /// Human readable reason
    pub reason: String,
}

/// Segments of a whole document plus the pages that were left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentSegments {
    /// Segments of all pages in page then reading order
    pub segments: Vec<Segment>,
    /// Pages skipped because of missing artifacts, no regions or bad geometry
    pub skipped_pages: Vec<SkippedPage>,
}

/// Segment every page of a document using its detection artifacts.
///
/// Per-page problems never abort the run: a missing or empty detection
/// artifact skips the page quietly, degenerate geometry and unreadable
/// artifacts skip it with an error log.
pub fn segment_document(
    layout: &DocumentLayout,
    artifacts: &ArtifactLayout,
    dpi: f64,
) -> DocumentSegments {
    let mut result = DocumentSegments::default();

    for (page_index, page) in layout.pages.iter().enumerate() {
        let path = artifacts.detection_path(page_index);
        let objects = match load_detected_objects(&path) {
            Ok(objects) => objects,
            Err(Error::MissingArtifact(_)) => {
                log::debug!("Page {}: no detection artifact, skipping", page_index);
                result.skipped_pages.push(SkippedPage {
                    page_index,
                    reason: "missing detection artifact".to_string(),
                });
                continue;
            },
            Err(e) => {
                log::error!("Page {}: unreadable detection artifact: {}", page_index, e);
                result.skipped_pages.push(SkippedPage {
                    page_index,
                    reason: e.to_string(),
                });
                continue;
            },
        };

        if objects.is_empty() {
            log::debug!("Page {}: no table regions detected, skipping", page_index);
            result.skipped_pages.push(SkippedPage {
                page_index,
                reason: "no table regions".to_string(),
            });
            continue;
        }

        let scale = match DpiScale::for_page(page_index, page.size(), dpi) {
            Ok(scale) => scale,
            Err(e) => {
                log::error!("{}, skipping page", e);
                result.skipped_pages.push(SkippedPage {
                    page_index,
                    reason: e.to_string(),
                });
                continue;
            },
        };

        let regions = match regions_from_objects(page_index, &objects, &scale) {
            Ok(regions) => regions,
            Err(e) => {
                log::error!("{}, skipping page", e);
                result.skipped_pages.push(SkippedPage {
                    page_index,
                    reason: e.to_string(),
                });
                continue;
            },
        };
        let segments = segment_page(page_index, page, &regions);
        log::debug!(
            "Page {}: {} regions, {} lines -> {} segments",
            page_index,
            regions.len(),
            page.lines.len(),
            segments.len()
        );
        result.segments.extend(segments);
    }

    result
}
