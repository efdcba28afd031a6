//! Telemetry generator module.
//!
//! Drives fixed-length sequences of synthetic sensor readings against the
//! stream ingestion endpoint, plus the single-shot activation and pattern
//! submissions. Every outcome, good or bad, ends up as a line in a
//! [`LogSink`]; nothing here returns an error to the caller.
//!
//! A sequence is strictly sequential: each reading is sampled, posted and
//! answered before the next one is sampled. An anomaly sequence is a normal
//! sequence whose temperature jumps out of range for a short window.

use std::ops::{Range, RangeInclusive};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{DeliveryClient, DeliveryResponse};
use crate::config::{Config, ConfigError, EndpointConfig};
use crate::payload::{
    build_activation_envelope, build_pattern_envelope, build_stream_envelope, Envelope,
    SensorReading,
};
use crate::sink::{ChannelSink, LogSink};

/// Number of readings sent per sequence.
pub const DEFAULT_ITERATIONS: u32 = 256;

/// Delay after each iteration.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1);

/// Temperature range outside the anomaly window (upper bound exclusive).
pub const NORMAL_TEMPERATURE: Range<i32> = 30..35;

/// Temperature range inside the anomaly window (upper bound exclusive).
pub const ANOMALY_TEMPERATURE: Range<i32> = 100..110;

/// Pressure range for every iteration (upper bound exclusive).
pub const PRESSURE: Range<i32> = 80..90;

/// Iterations whose temperature is out of range in an anomaly sequence.
pub const ANOMALY_WINDOW: RangeInclusive<u32> = 200..=201;

/// Name reported by the simulated sensor.
pub const SENSOR_NAME: &str = "Sensor 1";

/// Which kind of sequence to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Every reading in the normal ranges
    Normal,

    /// Normal readings with a temperature excursion in the anomaly window
    Anomaly,
}

impl std::fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceKind::Normal => write!(f, "normal"),
            SequenceKind::Anomaly => write!(f, "anomaly"),
        }
    }
}

/// Lifecycle of a sequence run.
///
/// A run that has not been spawned yet has no state; it exists only as a
/// [`TelemetryGenerator`] and a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Running,
    Completed,
    Cancelled,
}

/// Tunables for the generator. `Default` gives the demo's fixed behavior.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Number of iterations per sequence, numbered from 1
    pub iterations: u32,

    /// Delay after each iteration
    pub pacing: Duration,

    /// Temperature range for normal readings
    pub normal_temperature: Range<i32>,

    /// Temperature range inside the anomaly window
    pub anomaly_temperature: Range<i32>,

    /// Pressure range for all readings
    pub pressure: Range<i32>,

    /// Iterations affected in an anomaly sequence
    pub anomaly_window: RangeInclusive<u32>,

    /// Sensor name stamped on each reading
    pub sensor_name: String,
}

impl GeneratorSettings {
    /// Check that every sampling range can be sampled from.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first empty or reversed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("normal_temperature", &self.normal_temperature),
            ("anomaly_temperature", &self.anomaly_temperature),
            ("pressure", &self.pressure),
        ];

        for (name, range) in ranges {
            if range.is_empty() {
                return Err(ConfigError {
                    message: format!(
                        "{} range {}..{} is empty",
                        name, range.start, range.end
                    ),
                    env_var: None,
                });
            }
        }

        Ok(())
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            pacing: DEFAULT_PACING,
            normal_temperature: NORMAL_TEMPERATURE,
            anomaly_temperature: ANOMALY_TEMPERATURE,
            pressure: PRESSURE,
            anomaly_window: ANOMALY_WINDOW,
            sensor_name: SENSOR_NAME.to_string(),
        }
    }
}

/// Outcome of one submission, as seen by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// 1-based iteration number (always 1 for single-shot submissions)
    pub iteration: u32,

    /// Whether the listener answered 200 OK
    pub succeeded: bool,

    /// HTTP status, `None` if no response was received
    pub status: Option<StatusCode>,

    /// Response body or error text
    pub body: String,
}

impl DeliveryResult {
    fn from_response(iteration: u32, response: DeliveryResponse) -> Self {
        Self {
            iteration,
            succeeded: response.is_ok(),
            status: response.status,
            body: response.body,
        }
    }

    fn failed(iteration: u32, message: impl Into<String>) -> Self {
        Self {
            iteration,
            succeeded: false,
            status: None,
            body: message.into(),
        }
    }

    /// Log line for an iteration of a sequence.
    pub fn sequence_line(&self) -> String {
        if self.succeeded {
            format!("Sent payload N°{}, message: {}", self.iteration, self.body)
        } else {
            format!(
                "Payload N°{} Tx has failed, message: {}",
                self.iteration, self.body
            )
        }
    }

    /// Log line for a bot activation.
    pub fn activation_line(&self) -> String {
        if self.succeeded {
            format!("Bot activated successfully, message: {}", self.body)
        } else {
            format!("Bot activation has failed, message: {}", self.body)
        }
    }

    /// Log line for a pattern payload.
    pub fn pattern_line(&self) -> String {
        if self.succeeded {
            format!("Data Sent successfully, message: {}", self.body)
        } else {
            format!("Data Transmission has failed, message: {}", self.body)
        }
    }
}

/// Summary of a finished sequence run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    /// Identifier of the run, used in diagnostics
    pub run_id: Uuid,

    pub kind: SequenceKind,

    /// Iterations attempted
    pub attempts: u32,

    /// Iterations answered with 200 OK
    pub succeeded: u32,

    /// Iterations that failed for any reason
    pub failed: u32,

    /// `Completed`, or `Cancelled` if stopped early
    pub state: SequenceState,
}

/// Synthetic telemetry generator.
///
/// The generator holds no per-run state; each run owns its counters and its
/// random source, so several runs may share one generator.
pub struct TelemetryGenerator<C: DeliveryClient + ?Sized> {
    client: Arc<C>,
    activation_path: String,
    stream_path: String,
    settings: GeneratorSettings,
}

impl<C: DeliveryClient + ?Sized> TelemetryGenerator<C> {
    /// Create a generator with the default settings.
    pub fn new(client: Arc<C>, endpoints: &EndpointConfig) -> Self {
        Self {
            client,
            activation_path: endpoints.activation_path.clone(),
            stream_path: endpoints.stream_path.clone(),
            settings: GeneratorSettings::default(),
        }
    }

    /// Create a generator with custom settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any sampling range in `settings` is empty.
    pub fn with_settings(
        client: Arc<C>,
        endpoints: &EndpointConfig,
        settings: GeneratorSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        Ok(Self {
            settings,
            ..Self::new(client, endpoints)
        })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Temperature range used for `iteration` of a `kind` sequence.
    pub fn temperature_range(&self, iteration: u32, kind: SequenceKind) -> Range<i32> {
        match kind {
            SequenceKind::Anomaly if self.settings.anomaly_window.contains(&iteration) => {
                self.settings.anomaly_temperature.clone()
            }
            _ => self.settings.normal_temperature.clone(),
        }
    }

    /// Sample the reading for `iteration`, stamped with the current time.
    pub fn sample_reading<R: Rng>(
        &self,
        rng: &mut R,
        iteration: u32,
        kind: SequenceKind,
    ) -> SensorReading {
        let temperature = rng.gen_range(self.temperature_range(iteration, kind));
        let pressure = rng.gen_range(self.settings.pressure.clone());

        SensorReading::new(self.settings.sensor_name.clone(), temperature, pressure)
    }

    /// Run a full sequence with a freshly seeded random source.
    pub async fn run_sequence(
        &self,
        config: &Config,
        kind: SequenceKind,
        sink: &dyn LogSink,
        cancel: &CancellationToken,
    ) -> SequenceReport {
        let mut rng = StdRng::from_entropy();
        self.run_sequence_with_rng(config, kind, sink, cancel, &mut rng)
            .await
    }

    /// Run a full sequence using the given random source.
    ///
    /// Failed iterations are logged and skipped; the loop only stops early
    /// when `cancel` fires.
    pub async fn run_sequence_with_rng<R: Rng + Send>(
        &self,
        config: &Config,
        kind: SequenceKind,
        sink: &dyn LogSink,
        cancel: &CancellationToken,
        rng: &mut R,
    ) -> SequenceReport {
        let mut report = SequenceReport {
            run_id: Uuid::new_v4(),
            kind,
            attempts: 0,
            succeeded: 0,
            failed: 0,
            state: SequenceState::Running,
        };

        info!(
            run_id = %report.run_id,
            kind = %kind,
            iterations = self.settings.iterations,
            "Sequence started"
        );

        for iteration in 1..=self.settings.iterations {
            if cancel.is_cancelled() {
                break;
            }

            let reading = self.sample_reading(rng, iteration, kind);
            let result = self.deliver_reading(config, &reading, iteration).await;

            report.attempts += 1;
            if result.succeeded {
                report.succeeded += 1;
                debug!(run_id = %report.run_id, iteration, "Payload delivered");
            } else {
                report.failed += 1;
                warn!(
                    run_id = %report.run_id,
                    iteration,
                    status = ?result.status,
                    "Payload delivery failed"
                );
            }
            sink.append(result.sequence_line());

            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.settings.pacing) => {}
            }
        }

        report.state = if report.attempts == self.settings.iterations {
            SequenceState::Completed
        } else {
            SequenceState::Cancelled
        };

        info!(
            run_id = %report.run_id,
            kind = %kind,
            attempts = report.attempts,
            succeeded = report.succeeded,
            failed = report.failed,
            state = ?report.state,
            "Sequence finished"
        );

        report
    }

    async fn deliver_reading(
        &self,
        config: &Config,
        reading: &SensorReading,
        iteration: u32,
    ) -> DeliveryResult {
        let envelope = match build_stream_envelope(config, reading) {
            Ok(envelope) => Envelope::from(envelope),
            Err(e) => return DeliveryResult::failed(iteration, e.to_string()),
        };

        let response = self
            .client
            .post(&self.stream_path, &config.api_key, &envelope)
            .await;

        DeliveryResult::from_response(iteration, response)
    }

    /// Activate the edge bot once with the form's JSON body.
    pub async fn trigger_activation(&self, config: &Config, sink: &dyn LogSink) -> DeliveryResult {
        let envelope = Envelope::from(build_activation_envelope(config));
        let response = self
            .client
            .post(&self.activation_path, &config.api_key, &envelope)
            .await;

        let result = DeliveryResult::from_response(1, response);
        info!(succeeded = result.succeeded, status = ?result.status, "Bot activation sent");
        sink.append(result.activation_line());
        result
    }

    /// Send the form's JSON body once to the input stream as a data point.
    pub async fn send_pattern_payload(
        &self,
        config: &Config,
        sink: &dyn LogSink,
    ) -> DeliveryResult {
        let envelope = Envelope::from(build_pattern_envelope(config));
        let response = self
            .client
            .post(&self.stream_path, &config.api_key, &envelope)
            .await;

        let result = DeliveryResult::from_response(1, response);
        info!(succeeded = result.succeeded, status = ?result.status, "Pattern payload sent");
        sink.append(result.pattern_line());
        result
    }
}

/// A sequence running on its own task.
pub struct SequenceHandle {
    /// Log lines, one per iteration; closes when the run ends
    pub lines: mpsc::UnboundedReceiver<String>,

    /// Resolves to the run summary
    pub task: JoinHandle<SequenceReport>,

    cancel: CancellationToken,
}

impl SequenceHandle {
    /// Ask the run to stop before its next iteration.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Start a sequence in the background.
///
/// The caller is not required to wait for it; lines stream through
/// [`SequenceHandle::lines`] and the report arrives through
/// [`SequenceHandle::task`]. Each call gets its own random source.
pub fn spawn_sequence<C>(
    generator: Arc<TelemetryGenerator<C>>,
    config: Config,
    kind: SequenceKind,
) -> SequenceHandle
where
    C: DeliveryClient + ?Sized + 'static,
{
    let (sink, lines) = ChannelSink::new();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        generator.run_sequence(&config, kind, &sink, &token).await
    });

    SequenceHandle {
        lines,
        task,
        cancel,
    }
}
