//! `crew-client` — client side of the sequential crew pipeline protocol.
//!
//! A crew analysis runs five advisor agents one after another on the
//! backend. This crate submits an analysis, follows its progress over
//! server-sent events and reconciles the final result, so every consumer
//! (the CLI today) shares one implementation of the protocol.
//!
//! # Architecture
//!
//! ```text
//! PipelineDriver<R>   ← started guard, phases, watch channel of DriverView
//!     │
//!     ├── Submitter       POST /api/crew/{kind}         → AnalysisHandle
//!     │
//!     ├── ProgressStream  GET  <stream_url>             → Stream<PipelineStatus>
//!     │                      background task + mpsc channel, SseDecoder
//!     │
//!     └── fetch_final     GET  /api/crew/{kind}?id=…    → Reconciled<R>
//!                            exactly once, never fails
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use crew_client::{CrewEndpoint, PipelineDriver};
//! use launchpad_core::kind::PipelineKind;
//! use launchpad_core::results::RoadmapResults;
//!
//! let endpoint = CrewEndpoint::new(Some("http://localhost:3000"), PipelineKind::Roadmap)?
//!     .with_session(token);
//! let driver = PipelineDriver::<RoadmapResults>::new(reqwest::Client::new(), endpoint);
//! if let Some(reconciled) = driver.run(&serde_json::json!({"startup_data": form})).await? {
//!     println!("{:?}", reconciled.outcome);
//! }
//! ```

pub mod driver;
pub mod error;
pub mod reconcile;
pub mod sse;
pub mod stream;
pub mod submit;

pub use driver::{DriverView, Phase, PipelineDriver};
pub use error::CrewClientError;
pub use reconcile::fetch_final;
pub use sse::{SseDecoder, SseEvent};
pub use stream::ProgressStream;
pub use submit::{AnalysisHandle, CrewEndpoint, Submitter, SERVER_URL_VAR};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, CrewClientError>;
