//! Run report written at the end of a pipeline run.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::converters::RenderStats;
use crate::error::Result;
use crate::layout::{Segment, SkippedPage};
use crate::summarize::TableSummary;

/// Totals of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    /// Text segments produced
    pub text_segments: usize,
    /// Table segments produced
    pub table_segments: usize,
    /// Tables rendered from their structure artifact
    pub rendered_tables: usize,
    /// Tables left with raw line text
    pub fallback_tables: usize,
    /// Pages that produced no segments
    pub skipped_pages: usize,
    /// Tables with a summary
    pub summaries_succeeded: usize,
    /// Tables whose summary failed
    pub summaries_failed: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// When the report was created
    pub generated_at: DateTime<Utc>,
    /// Document prefix the artifacts were read with
    pub prefix: String,
    /// Totals
    pub stats: ReportStats,
    /// Segments in document order
    pub segments: Vec<Segment>,
    /// Pages left out of segmentation
    pub skipped_pages: Vec<SkippedPage>,
    /// One entry per table segment, in document order
    pub summaries: Vec<TableSummary>,
}

impl SummaryReport {
    /// Assemble a report and compute its totals.
    pub fn new(
        prefix: impl Into<String>,
        segments: Vec<Segment>,
        skipped_pages: Vec<SkippedPage>,
        render: RenderStats,
        summaries: Vec<TableSummary>,
    ) -> Self {
        let table_segments = segments.iter().filter(|s| s.is_table()).count();
        let summaries_failed = summaries.iter().filter(|s| s.is_failed()).count();
        let stats = ReportStats {
            text_segments: segments.len() - table_segments,
            table_segments,
            rendered_tables: render.rendered,
            fallback_tables: render.fallback,
            skipped_pages: skipped_pages.len(),
            summaries_succeeded: summaries.len() - summaries_failed,
            summaries_failed,
        };

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            prefix: prefix.into(),
            stats,
            segments,
            skipped_pages,
            summaries,
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
