//! Context windows around table segments.
//!
//! The context of a table is taken from its immediate neighbors in the
//! ordered segment list, and only from neighbors that are text. A neighbor's
//! text is split into newline-separated chunks, the chunks are scored by
//! cosine similarity against a reference embedding, and only the chunks above
//! the [`BreakpointThreshold`] are kept.
//!
//! By default the reference is the embedding of the neighbor's whole text, so
//! the filter keeps the chunks most representative of that neighbor.
//! [`ReferenceMode::TableContent`] compares against the table's own content
//! instead.

mod breakpoint;
mod similarity;

use serde::{Deserialize, Serialize};

pub use breakpoint::{filter_chunks, percentile, BreakpointKind, BreakpointThreshold};
pub use similarity::cosine_similarity;

use crate::error::{Error, Result};
use crate::layout::Segment;
use crate::services::{Embedder, RetryPolicy};

/// Context kept around one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Kept chunks of the preceding text segment
    pub prev_context: String,
    /// Kept chunks of the following text segment
    pub after_context: String,
}

/// What neighbor chunks are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// The neighbor's own text taken as a whole
    #[default]
    NeighborText,
    /// The content of the table the context is built for
    TableContent,
}

/// Builds [`ContextWindow`]s for table segments.
pub struct WindowingEngine<'a> {
    embedder: &'a dyn Embedder,
    breakpoint: BreakpointThreshold,
    reference: ReferenceMode,
    retry: RetryPolicy,
}

impl<'a> WindowingEngine<'a> {
    /// Create an engine with the default breakpoint and reference mode.
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            breakpoint: BreakpointThreshold::default(),
            reference: ReferenceMode::default(),
            retry: RetryPolicy::none(),
        }
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

    /// Set the retry policy for embedding calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Context window of the table segment at `index`.
    ///
    /// A side whose neighbor is missing or is not a text segment stays empty.
    pub async fn window_for(&self, segments: &[Segment], index: usize) -> Result<ContextWindow> {
        let Some(table) = segments.get(index) else {
            return Ok(ContextWindow::default());
        };

        let before = index
            .checked_sub(1)
            .and_then(|i| segments.get(i))
            .filter(|s| s.is_text());
        let after = segments.get(index + 1).filter(|s| s.is_text());

        let prev_context = match before {
            Some(neighbor) => self.neighbor_context(&neighbor.content, &table.content).await?,
            None => String::new(),
        };
        let after_context = match after {
            Some(neighbor) => self.neighbor_context(&neighbor.content, &table.content).await?,
            None => String::new(),
        };

        Ok(ContextWindow {
            prev_context,
            after_context,
        })
    }

    /// Kept chunks of one neighbor text.
    ///
    /// All chunks and the reference text go to the embedder in one batch,
    /// reference last.
    pub async fn neighbor_context(&self, neighbor_text: &str, table_content: &str) -> Result<String> {
        let chunks: Vec<&str> = neighbor_text.split('\n').collect();
        let reference = match self.reference {
            ReferenceMode::NeighborText => neighbor_text,
            ReferenceMode::TableContent => table_content,
        };

        let mut inputs: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
        inputs.push(reference.to_string());

        let mut embeddings = self
            .retry
            .run("embedding", || self.embedder.embed(&inputs))
            .await?;
        if embeddings.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                embeddings.len()
            )));
        }

        let reference_embedding = embeddings.pop().unwrap_or_default();
        let dim = reference_embedding.len();
        if dim == 0 {
            return Err(Error::Embedding("empty reference embedding".to_string()));
        }
        if let Some((i, e)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dim) {
            return Err(Error::Embedding(format!(
                "chunk {} has dimension {}, reference has {}",
                i,
                e.len(),
                dim
            )));
        }
        let scores: Vec<f32> = embeddings
            .iter()
            .map(|e| cosine_similarity(e, &reference_embedding))
            .collect();

        let Some(threshold) = self.breakpoint.threshold(&scores) else {
            return Ok(String::new());
        };
        let context = filter_chunks(&chunks, &scores, threshold);
        log::debug!(
            "{:?} breakpoint {:.4} over {} chunks kept {} bytes",
            self.breakpoint.kind,
            threshold,
            chunks.len(),
            context.len()
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Maps each known text to a fixed vector; anything else is `[0, 0, 1]`.
    struct TableEmbedder {
        known: Vec<(&'static str, Vec<f32>)>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
            if let Ok(mut batches) = self.batches.lock() {
                batches.push(inputs.to_vec());
            }
            Ok(inputs
                .iter()
                .map(|text| {
                    self.known
                        .iter()
                        .find(|(k, _)| k == text)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| vec![0.0, 0.0, 1.0])
                })
                .collect())
        }
    }

    fn embedder() -> TableEmbedder {
        TableEmbedder {
            known: vec![
                ("Alpha", vec![1.0, 0.0, 0.0]),
                ("Beta", vec![0.0, 1.0, 0.0]),
                ("Gamma", vec![1.0, 0.1, 0.0]),
                ("Alpha\nBeta\nGamma", vec![1.0, 0.0, 0.0]),
            ],
            batches: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_one_batch_with_reference_last() {
        let embedder = embedder();
        let engine = WindowingEngine::new(&embedder);
        engine.neighbor_context("Alpha\nBeta\nGamma", "| t |").await.unwrap();

        let batches = embedder.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["Alpha", "Beta", "Gamma", "Alpha\nBeta\nGamma"]);
    }

    #[tokio::test]
    async fn test_low_percentile_keeps_similar_chunks() {
        let embedder = embedder();
        let engine = WindowingEngine::new(&embedder)
            .with_breakpoint(BreakpointThreshold::new(BreakpointKind::Percentile).with_amount(30.0));
        let context = engine.neighbor_context("Alpha\nBeta\nGamma", "").await.unwrap();
        assert_eq!(context, "Alpha\nGamma\n");
    }

    #[tokio::test]
    async fn test_table_content_reference() {
        let embedder = embedder();
        let engine = WindowingEngine::new(&embedder)
            .with_breakpoint(BreakpointThreshold::new(BreakpointKind::Percentile).with_amount(50.0))
            .with_reference(ReferenceMode::TableContent);
        let context = engine.neighbor_context("Alpha\nBeta\nGamma", "Beta").await.unwrap();
        assert_eq!(context, "Beta\n");

        let batches = embedder.batches.lock().unwrap();
        assert_eq!(batches[0].last().map(String::as_str), Some("Beta"));
    }

    #[tokio::test]
    async fn test_window_sides() {
        let embedder = embedder();
        let engine = WindowingEngine::new(&embedder)
            .with_breakpoint(BreakpointThreshold::new(BreakpointKind::Percentile).with_amount(30.0));
        let segments = vec![
            Segment::table(0, 0, "| a |"),
            Segment::text(0, "Alpha\nBeta\nGamma"),
            Segment::table(0, 1, "| b |"),
            Segment::table(0, 2, "| c |"),
        ];

        let first = engine.window_for(&segments, 0).await.unwrap();
        assert_eq!(first.prev_context, "");
        assert_eq!(first.after_context, "Alpha\nGamma\n");

        let middle = engine.window_for(&segments, 2).await.unwrap();
        assert_eq!(middle.prev_context, "Alpha\nGamma\n");
        assert_eq!(middle.after_context, "");

        let last = engine.window_for(&segments, 3).await.unwrap();
        assert_eq!(last, ContextWindow::default());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        struct Short;

        #[async_trait]
        impl Embedder for Short {
            async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>> {
                Ok(vec![vec![1.0]])
            }
        }

        let engine = WindowingEngine::new(&Short);
        let err = engine.neighbor_context("a\nb", "").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        /// Chunks get three dimensions, the reference (last input) only one.
        struct Ragged {
            empty_reference: bool,
        }

        #[async_trait]
        impl Embedder for Ragged {
            async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
                let mut out = vec![vec![1.0, 0.0, 0.0]; inputs.len() - 1];
                out.push(if self.empty_reference { Vec::new() } else { vec![1.0] });
                Ok(out)
            }
        }

        for empty_reference in [false, true] {
            let embedder = Ragged { empty_reference };
            let engine = WindowingEngine::new(&embedder);
            let err = engine.neighbor_context("a\nb", "").await.unwrap_err();
            assert!(matches!(err, Error::Embedding(_)));
        }
    }
}
