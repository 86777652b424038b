//! `signals-runtime` – wiring and process plumbing.
//!
//! # Modules
//!
//! - [`pipeline`] – [`SignalPipeline`]: builds one bus, the decision core on
//!   top of it, and whichever presentation channels the caller asks for.
//! - [`scenario`] – the scripted reference conversation used by the demo and
//!   by end-to-end tests.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod pipeline;
pub mod scenario;
pub mod telemetry;

pub use pipeline::{SignalPipeline, SignalPipelineBuilder};
pub use scenario::{DEMO_CONTEXT, ScenarioPhase, reference_scenario};
