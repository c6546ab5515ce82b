//! textsmith - Text Improvement Service Library
//!
//! Forwards text to an external improvement model, either synchronously or
//! as a background job, with a process-lifetime cache in front of it:
//! - `cache`: memo of input text to improved text
//! - `jobs`: job records, their state machine, the runner and the worker pool
//! - `improver`: the provider seam (OpenAI-compatible client, simulated stand-in)
//! - `service`: the synchronous and asynchronous entry points
//! - `server`: the axum HTTP surface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use textsmith::{ImprovementService, SimulatedImprover};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let improver = Arc::new(SimulatedImprover::new(Duration::ZERO));
//!     let service = ImprovementService::new(improver, 4);
//!     println!("{}", service.improve_now("I has a apple").await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod improver;
pub mod jobs;
pub mod resolver;
pub mod server;
pub mod service;
pub mod validation;

pub use cache::TextCache;
pub use config::Config;
pub use improver::{ImproveError, Improver, OpenAiImprover, SimulatedImprover};
pub use jobs::{Job, JobId, JobStatus, JobStore};
pub use server::{router, ServerState};
pub use service::ImprovementService;
pub use validation::{TextRules, ValidationError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
