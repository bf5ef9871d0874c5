//! Probe testing framework for WMS GetMap endpoints.
//!
//! This crate provides tools to:
//! - Generate geographically-varying GetMap bounding boxes (random sampling,
//!   random walks and zoom sequences inside a spatial extent)
//! - Execute probe batches with controlled concurrency and periodic
//!   connection renewal
//! - Record per-request latency and status in multiple formats (console,
//!   CSV, bbox listings)

pub mod batch;
pub mod capabilities;
pub mod config;
pub mod generator;
pub mod metrics;
pub mod probe;
pub mod report;
pub mod runner;
pub mod transport;

pub use batch::build_batch;
pub use config::{ConfigError, GeneratorTuning, OutputFormat, ProbeConfig, TestClass};
pub use generator::{BoxGenerator, GeneratorError};
pub use metrics::{MetricsCollector, RunSummary};
pub use probe::{ProbeOutcome, ProbeResult, ProbeTest, RequestParams};
pub use report::{LineSink, ResultSink, SummaryReport};
pub use runner::{DispatchEngine, BUSY_RETRY_DELAY, MAX_CONNECTIONS};
pub use transport::{
    HttpTransport, HttpTransportFactory, Transport, TransportError, TransportFactory,
    TransportResponse,
};
