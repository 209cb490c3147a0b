//! Context-aware table summarization.
//!
//! [`TableSummarizer`] computes the context window of every table segment,
//! then sends one generation request per table through a bounded, ordered
//! stream. Every table gets a [`TableSummary`], failed or not, in the order
//! the tables appear in the segment list.

mod prompt;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

pub use prompt::Prompt;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::layout::Segment;
use crate::services::{Embedder, RetryPolicy, SamplingParams, TextGenerator};
use crate::windowing::{BreakpointThreshold, ContextWindow, ReferenceMode, WindowingEngine};

/// Result of summarizing one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// Generated summary text
    Summary {
        /// Summary returned by the generation service
        text: String,
    },
    /// Context or generation failed for this table
    Failed {
        /// Error message
        error: String,
    },
}

/// Summary of one table segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Position of the table in the segment list
    pub segment_index: usize,
    /// Page the table is on
    pub page_index: usize,
    /// Table ordinal within the page
    pub table_ordinal: Option<usize>,
    /// Context the prompt was built with
    pub context: ContextWindow,
    /// Summary or failure
    pub outcome: SummaryOutcome,
}

impl TableSummary {
    /// Summary text, if generation succeeded.
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            SummaryOutcome::Summary { text } => Some(text),
            SummaryOutcome::Failed { .. } => None,
        }
    }

    /// Check if this table failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SummaryOutcome::Failed { .. })
    }
}

/// Summarizes table segments with an embedding and a generation service.
pub struct TableSummarizer<'a> {
    embedder: &'a dyn Embedder,
    generator: &'a dyn TextGenerator,
    breakpoint: BreakpointThreshold,
    reference: ReferenceMode,
    sampling: SamplingParams,
    retry: RetryPolicy,
    max_concurrency: usize,
}

impl<'a> TableSummarizer<'a> {
    /// Create a summarizer with default settings.
    pub fn new(embedder: &'a dyn Embedder, generator: &'a dyn TextGenerator) -> Self {
        Self {
            embedder,
            generator,
            breakpoint: BreakpointThreshold::default(),
            reference: ReferenceMode::default(),
            sampling: SamplingParams::default(),
            retry: RetryPolicy::default(),
            max_concurrency: 4,
        }
    }

    /// Create a summarizer using the windowing, sampling and retry settings
    /// of a pipeline configuration.
    pub fn from_config(
        embedder: &'a dyn Embedder,
        generator: &'a dyn TextGenerator,
        config: &PipelineConfig,
    ) -> Self {
        Self::new(embedder, generator)
            .with_breakpoint(config.breakpoint)
            .with_reference(config.reference)
            .with_sampling(config.sampling)
            .with_retry(config.retry)
            .with_max_concurrency(config.max_concurrency)
    }

    /// Set the breakpoint rule.
    pub fn with_breakpoint(mut self, breakpoint: BreakpointThreshold) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    /// Set the similarity reference.
    pub fn with_reference(mut self, reference: ReferenceMode) -> Self {
        self.reference = reference;
        self
    }

    /// Set the sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the retry policy for both services.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of generation requests in flight (at least 1).
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Summarize every table segment.
    ///
    /// The result has one entry per table segment, in segment order. A table
    /// whose context or generation fails is reported as
    /// [`SummaryOutcome::Failed`]; the other tables are unaffected.
    pub async fn summarize(&self, segments: &[Segment]) -> Vec<TableSummary> {
        let windowing = WindowingEngine::new(self.embedder)
            .with_breakpoint(self.breakpoint)
            .with_reference(self.reference)
            .with_retry(self.retry);

        let mut jobs = Vec::new();
        for (index, segment) in segments.iter().enumerate().filter(|(_, s)| s.is_table()) {
            let window = windowing.window_for(segments, index).await;
            jobs.push((index, segment, window));
        }
        log::info!(
            "Summarizing {} tables with up to {} requests in flight",
            jobs.len(),
            self.max_concurrency
        );

        stream::iter(jobs)
            .map(|(index, segment, window)| self.summarize_table(index, segment, window))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn summarize_table(
        &self,
        segment_index: usize,
        segment: &Segment,
        window: Result<ContextWindow>,
    ) -> TableSummary {
        let (context, outcome) = match window {
            Ok(context) => {
                let outcome = match self.generate(segment, &context).await {
                    Ok(text) => SummaryOutcome::Summary { text },
                    Err(e) => {
                        log::error!("Table at segment {}: generation failed: {}", segment_index, e);
                        SummaryOutcome::Failed {
                            error: e.to_string(),
                        }
                    },
                };
                (context, outcome)
            },
            Err(e) => {
                log::error!("Table at segment {}: context failed: {}", segment_index, e);
                (
                    ContextWindow::default(),
                    SummaryOutcome::Failed {
                        error: e.to_string(),
                    },
                )
            },
        };

        TableSummary {
            segment_index,
            page_index: segment.page_index,
            table_ordinal: segment.table_ordinal,
            context,
            outcome,
        }
    }

    async fn generate(&self, segment: &Segment, context: &ContextWindow) -> Result<String> {
        let prompt =
            Prompt::new(&segment.content, &context.prev_context, &context.after_context).render();
        self.retry
            .run("generation", || self.generator.generate(&prompt, &self.sampling))
            .await
    }
}
