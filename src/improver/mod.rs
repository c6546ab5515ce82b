//! The external text-improvement provider
//!
//! The rest of the service only sees the [`Improver`] trait: an opaque,
//! fallible, possibly slow call from input text to improved text.

pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ProviderConfig, ProviderKind};

pub use openai::OpenAiImprover;

/// Failure of the provider call. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum ImproveError {
    /// Transport failure, including timeouts
    #[error("request to provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned an empty completion")]
    EmptyCompletion,

    /// Anything else a non-HTTP implementation needs to report
    #[error("{0}")]
    Other(String),
}

/// Turns text into its improved form.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Improver: Send + Sync {
    async fn improve(&self, text: &str) -> Result<String, ImproveError>;
}

/// Offline stand-in for a real provider: waits, then prefixes the input.
#[derive(Debug, Clone)]
pub struct SimulatedImprover {
    delay: Duration,
}

impl SimulatedImprover {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Improver for SimulatedImprover {
    async fn improve(&self, text: &str) -> Result<String, ImproveError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("Improved: {}", text))
    }
}

/// Build the improver selected by the provider config
pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Arc<dyn Improver>> {
    match config.kind {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiImprover::from_config(config)?)),
        ProviderKind::Simulated => Ok(Arc::new(SimulatedImprover::new(Duration::from_millis(
            config.simulated_delay_ms,
        )))),
    }
}
