//! Configuration for segmentation and summarization runs.
//!
//! Every field has a default, so a configuration file only needs the keys it
//! changes:
//!
//! ```json
//! { "dpi": 200, "breakpoint": { "kind": "interquartile" }, "max_concurrency": 8 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::DEFAULT_DPI;
use crate::services::{RetryPolicy, SamplingParams};
use crate::windowing::{BreakpointThreshold, ReferenceMode};

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Resolution the detection artifacts were produced at.
    pub dpi: f64,

    /// Breakpoint rule for context chunks.
    pub breakpoint: BreakpointThreshold,

    /// What context chunks are compared against.
    pub reference: ReferenceMode,

    /// Maximum number of generation requests in flight.
    pub max_concurrency: usize,

    /// Retry schedule for service calls.
    pub retry: RetryPolicy,

    /// Generation sampling parameters.
    pub sampling: SamplingParams,

    /// Service endpoints and models.
    pub service: ServiceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            breakpoint: BreakpointThreshold::default(),
            reference: ReferenceMode::default(),
            max_concurrency: 4,
            retry: RetryPolicy::default(),
            sampling: SamplingParams::default(),
            service: ServiceConfig::default(),
        }
    }

    /// Load a configuration file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Config(format!("cannot open {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(Error::Config(format!("dpi must be positive, got {}", self.dpi)));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".to_string()));
        }
        if !self.breakpoint.amount().is_finite() {
            return Err(Error::Config("breakpoint amount must be finite".to_string()));
        }
        Ok(())
    }

    /// Set the detection resolution.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
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

    /// Set the maximum number of generation requests in flight.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the retry schedule.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the service settings.
    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.service = service;
        self
    }
}

/// Where the embedding and generation services live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Chat model name
    pub generation_model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            generation_model: "gpt-3.5-turbo-0125".to_string(),
            timeout_secs: 60,
        }
    }
}

impl ServiceConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::windowing::BreakpointKind;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.dpi, 300.0);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.breakpoint.kind, BreakpointKind::Percentile);
        assert_eq!(config.sampling.max_tokens, 512);
        assert_eq!(config.service.generation_model, "gpt-3.5-turbo-0125");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dpi": 200, "breakpoint": {{"kind": "interquartile", "amount": 2.0}},
                "retry": {{"max_attempts": 5}}, "reference": "table_content"}}"#
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.dpi, 200.0);
        assert_eq!(config.breakpoint.kind, BreakpointKind::Interquartile);
        assert_eq!(config.breakpoint.amount(), 2.0);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 500);
        assert_eq!(config.reference, ReferenceMode::TableContent);
        assert_eq!(config.max_concurrency, 4);
    }

    #[test]
    fn test_invalid_values() {
        assert!(PipelineConfig::new().with_max_concurrency(0).validate().is_err());
        assert!(PipelineConfig::new().with_dpi(0.0).validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineConfig::from_json_file("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
