//! A2G Demo Library
//!
//! Components for exercising an A2G listener by hand:
//!
//! - **config**: Form values and environment-based endpoint settings
//! - **payload**: Activation and stream envelopes, synthetic sensor readings
//! - **client**: HTTP delivery client that never fails a caller
//! - **sink**: Destinations for user-facing log lines
//! - **generator**: Fixed-length normal and anomaly telemetry sequences
//! - **format**: JSON body pretty-printing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use a2g_demo::config::{Config, EndpointConfig};
//! use a2g_demo::client::HttpDeliveryClient;
//! use a2g_demo::generator::{spawn_sequence, SequenceKind, TelemetryGenerator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let endpoints = EndpointConfig::from_env().expect("Failed to load config");
//!     let client = Arc::new(HttpDeliveryClient::new(&endpoints).expect("Failed to create client"));
//!     let generator = Arc::new(TelemetryGenerator::new(client, &endpoints));
//!
//!     let config = Config::new("api-key", "activation-key", "stream-key", "{}");
//!     let mut handle = spawn_sequence(generator, config, SequenceKind::Anomaly);
//!
//!     while let Some(line) = handle.lines.recv().await {
//!         println!("{}", line);
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod format;
pub mod generator;
pub mod payload;
pub mod sink;

pub use client::{ClientError, ClientStats, DeliveryClient, DeliveryResponse, HttpDeliveryClient};
pub use config::{Config, ConfigError, EndpointConfig};
pub use format::pretty_print_json;
pub use generator::{
    spawn_sequence, DeliveryResult, GeneratorSettings, SequenceHandle, SequenceKind,
    SequenceReport, SequenceState, TelemetryGenerator,
};
pub use payload::{ActivationEnvelope, Envelope, PayloadError, SensorReading, StreamEnvelope};
pub use sink::{ChannelSink, LogSink, MemorySink, TracingSink, WriterSink};
