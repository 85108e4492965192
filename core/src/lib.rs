//! Resilient API client core for the Learnify attendance service.
//!
//! # Overview
//! Builds fully specified requests, sends them through a pluggable
//! `Transport` with bounded retries, and decodes the service's
//! `{success, data, message}` envelope into typed records.
//!
//! # Design
//! - `LearnifyClient` is constructed explicitly and cloned freely; there is no
//!   process-wide instance.
//! - Each operation is split into `build_*` (pure, produces a
//!   `CallDescriptor`) and an async method that executes and decodes it, so the
//!   I/O boundary stays explicit.
//! - Only a dropped connection is retried, with linear backoff. Timeouts,
//!   DNS/TLS failures, non-2xx statuses and decode failures surface on the
//!   attempt that produced them.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use client::LearnifyClient;
pub use config::{CachePolicy, ClientConfig, ConfigError, Environment, TransportConfig};
pub use error::{ApiError, ErrorKind, TransportError, TransportErrorKind};
pub use executor::{AttemptEvent, AttemptObserver, AttemptResult, Executor, RetryPolicy, TracingObserver};
pub use http::{CallDescriptor, HttpMethod, HttpResponse, Operation};
pub use request::{QueryParams, RequestBuilder};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CheckIn, CheckInHistory, CheckInReceipt, LeaderboardEntry, LeaderboardPage, LeaderboardWindow,
    Review, ReviewAuthor, ReviewFilters, ReviewPage, ReviewWindow, Student, StudentRoster,
    SubmittedReview,
};
pub use tokio_util::sync::CancellationToken;
