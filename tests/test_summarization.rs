//! Table summarization with fake embedding and generation services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use table_context::services::{Embedder, RetryPolicy, SamplingParams, TextGenerator};
use table_context::{
    BreakpointKind, BreakpointThreshold, Error, Result, Segment, SummaryOutcome, TableSummarizer,
};

/// Texts containing "keep" embed to `[1, 0]`, other texts containing "drop"
/// to `[0, 1]`, everything else to `[1, 0]`. A batch with a text containing
/// "BROKEN" fails.
struct FlatEmbedder;

#[async_trait]
impl Embedder for FlatEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.iter().any(|t| t.contains("BROKEN")) {
            return Err(Error::Service {
                service: "embedding",
                status: Some(400),
                message: "rejected input".to_string(),
            });
        }
        Ok(inputs
            .iter()
            .map(|t| {
                if !t.contains("keep") && t.contains("drop") {
                    vec![0.0, 1.0]
                } else {
                    vec![1.0, 0.0]
                }
            })
            .collect())
    }
}

/// Echoes the table line of the prompt after a delay that shrinks with the
/// table number, so later tables finish first.
#[derive(Default)]
struct EchoGenerator {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    flaky_failures_left: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl EchoGenerator {
    fn flaky(failures: usize) -> Self {
        let generator = Self::default();
        generator.flaky_failures_left.store(failures, Ordering::SeqCst);
        generator
    }
}

fn table_name(prompt: &str) -> String {
    prompt
        .split(" table: ")
        .nth(1)
        .and_then(|rest| rest.split(" Following context:").next())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        assert_eq!(params.max_tokens, 512);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let name = table_name(prompt);
        let number: u64 = name.trim_start_matches('T').parse().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(number * 5))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if name.contains("FAIL") {
            return Err(Error::Service {
                service: "generation",
                status: Some(400),
                message: "content filtered".to_string(),
            });
        }
        let flaky = self
            .flaky_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if flaky.is_ok() {
            return Err(Error::Service {
                service: "generation",
                status: Some(429),
                message: "rate limited".to_string(),
            });
        }
        Ok(format!("summary of {name}"))
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 4,
        multiplier: 2.0,
    }
}

fn tables(names: &[&str]) -> Vec<Segment> {
    let mut segments = vec![Segment::text(0, "Intro line")];
    for (i, name) in names.iter().enumerate() {
        segments.push(Segment::table(0, i, *name));
        segments.push(Segment::text(0, format!("Text after {name}")));
    }
    segments
}

#[tokio::test]
async fn test_one_summary_per_table_in_document_order() {
    let segments = tables(&["T0", "T1", "T2", "T3", "T4", "T5"]);
    let generator = EchoGenerator::default();
    let summaries = TableSummarizer::new(&FlatEmbedder, &generator)
        .with_retry(fast_retry())
        .with_max_concurrency(6)
        .summarize(&segments)
        .await;

    assert_eq!(summaries.len(), 6);
    for (k, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.segment_index, 1 + 2 * k);
        assert_eq!(summary.table_ordinal, Some(k));
        assert_eq!(summary.text(), Some(format!("summary of T{k}").as_str()));
    }
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let segments = tables(&["T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7"]);
    let generator = EchoGenerator::default();
    TableSummarizer::new(&FlatEmbedder, &generator)
        .with_retry(fast_retry())
        .with_max_concurrency(2)
        .summarize(&segments)
        .await;

    assert_eq!(generator.calls.load(Ordering::SeqCst), 8);
    assert!(generator.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_generation_failure_is_isolated() {
    let segments = tables(&["T0", "FAIL", "T2"]);
    let generator = EchoGenerator::default();
    let summaries = TableSummarizer::new(&FlatEmbedder, &generator)
        .with_retry(fast_retry())
        .summarize(&segments)
        .await;

    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].text(), Some("summary of T0"));
    assert!(summaries[1].is_failed());
    match &summaries[1].outcome {
        SummaryOutcome::Failed { error } => assert!(error.contains("content filtered")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(summaries[2].text(), Some("summary of T2"));
    // permanent failure: no retries
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_context_failure_marks_only_that_table() {
    let segments = vec![
        Segment::text(0, "fine prose"),
        Segment::table(0, 0, "T0"),
        Segment::text(0, "BROKEN prose"),
        Segment::table(0, 1, "T1"),
        Segment::table(0, 2, "T2"),
    ];
    let generator = EchoGenerator::default();
    let summaries = TableSummarizer::new(&FlatEmbedder, &generator)
        .with_retry(fast_retry())
        .summarize(&segments)
        .await;

    assert_eq!(summaries.len(), 3);
    // T0 and T1 both border the broken text segment
    assert!(summaries[0].is_failed());
    assert!(summaries[1].is_failed());
    assert_eq!(summaries[2].text(), Some("summary of T2"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let segments = tables(&["T0"]);
    let generator = EchoGenerator::flaky(2);
    let summaries = TableSummarizer::new(&FlatEmbedder, &generator)
        .with_retry(fast_retry())
        .summarize(&segments)
        .await;

    assert_eq!(summaries[0].text(), Some("summary of T0"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_prompt_carries_contexts_verbatim() {
    let segments = vec![
        Segment::text(0, "keep {x}\ndrop this"),
        Segment::table(0, 0, "T0 | {qty} |"),
        Segment::text(0, "drop that\nkeep ${y}"),
    ];
    let generator = EchoGenerator::default();
    let summaries = TableSummarizer::new(&FlatEmbedder, &generator)
        .with_breakpoint(BreakpointThreshold::new(BreakpointKind::Percentile).with_amount(0.0))
        .with_retry(fast_retry())
        .summarize(&segments)
        .await;

    assert_eq!(summaries[0].context.prev_context, "keep {x}\n");
    assert_eq!(summaries[0].context.after_context, "keep ${y}\n");

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with(
        "Previous context: keep {x}\n table: T0 | {qty} | Following context: keep ${y}\n"
    ));
}

#[tokio::test]
async fn test_no_tables_no_calls() {
    let segments = vec![Segment::text(0, "only prose")];
    let generator = EchoGenerator::default();
    let summaries = TableSummarizer::new(&FlatEmbedder, &generator)
        .summarize(&segments)
        .await;
    assert!(summaries.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}
