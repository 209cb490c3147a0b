//! End-to-end document run.
//!
//! ```text
//! DocumentLayout + detection artifacts
//!     ↓
//! [segment_document] (lines → ordered Text/Table segments)
//!     ↓
//! [TableRenderer] (structure artifacts → markdown tables)
//!     ↓
//! [TableSummarizer] (context windows → one summary per table)
//!     ↓
//! SummaryReport
//! ```

mod report;

pub use report::{ReportStats, SummaryReport};

use crate::artifacts::ArtifactLayout;
use crate::config::PipelineConfig;
use crate::converters::{RenderStats, TableRenderer};
use crate::error::Result;
use crate::layout::{segment_document, DocumentLayout, DocumentSegments};
use crate::services::{Embedder, TextGenerator};
use crate::summarize::TableSummarizer;

/// Runs segmentation, table rendering and summarization for one document.
pub struct DocumentPipeline {
    config: PipelineConfig,
    artifacts: ArtifactLayout,
}

impl DocumentPipeline {
    /// Create a pipeline, rejecting an invalid configuration.
    pub fn new(config: PipelineConfig, artifacts: ArtifactLayout) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, artifacts })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the artifact locations.
    pub fn artifacts(&self) -> &ArtifactLayout {
        &self.artifacts
    }

    /// Segment the document and render its tables.
    pub fn segment(&self, layout: &DocumentLayout) -> (DocumentSegments, RenderStats) {
        let mut document = segment_document(layout, &self.artifacts, self.config.dpi);
        let render = TableRenderer::new(&self.artifacts).render_segments(&mut document.segments);
        log::info!(
            "{}: {} segments from {} pages ({} skipped), {} tables rendered, {} raw",
            self.artifacts.prefix,
            document.segments.len(),
            layout.page_count(),
            document.skipped_pages.len(),
            render.rendered,
            render.fallback
        );
        (document, render)
    }

    /// Segment and render without calling any service.
    pub fn segments_only(&self, layout: &DocumentLayout) -> SummaryReport {
        let (document, render) = self.segment(layout);
        SummaryReport::new(
            self.artifacts.prefix.clone(),
            document.segments,
            document.skipped_pages,
            render,
            Vec::new(),
        )
    }

    /// Full run: segment, render and summarize every table.
    pub async fn run(
        &self,
        layout: &DocumentLayout,
        embedder: &dyn Embedder,
        generator: &dyn TextGenerator,
    ) -> SummaryReport {
        let (document, render) = self.segment(layout);
        let summaries = TableSummarizer::from_config(embedder, generator, &self.config)
            .summarize(&document.segments)
            .await;

        let report = SummaryReport::new(
            self.artifacts.prefix.clone(),
            document.segments,
            document.skipped_pages,
            render,
            summaries,
        );
        log::info!(
            "{}: {} summaries, {} failed",
            report.prefix,
            report.stats.summaries_succeeded,
            report.stats.summaries_failed
        );
        report
    }
}
