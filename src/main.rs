//! A2G Demo - manual trigger and synthetic telemetry for an A2G listener
//!
//! Usage: `a2g-demo <command>`
//!
//! ## Commands
//!
//! - `activate`: trigger the edge bot once with the JSON body
//! - `pattern`: send the JSON body once to the input stream
//! - `normal`: stream 256 readings in the normal ranges
//! - `anomaly`: stream 256 readings with an excursion at iterations 200-201
//! - `format`: pretty-print the JSON body
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `A2G_API_KEY`: value of the `X-API-KEY` header
//! - `A2G_ACTIVATION_KEY`: edge bot activation key
//! - `A2G_STREAM_KEY`: input stream key
//! - `A2G_JSON_BODY`: JSON body for `activate`, `pattern` and `format`
//! - `A2G_BASE_URL`: listener URL (default: https://listen.a2g.io)
//! - `A2G_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: 30)
//! - `RUST_LOG`: Logging level filter (default: info)

use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use a2g_demo::client::HttpDeliveryClient;
use a2g_demo::config::{Config, EndpointConfig};
use a2g_demo::format::pretty_print_json;
use a2g_demo::generator::{spawn_sequence, SequenceKind, SequenceState, TelemetryGenerator};
use a2g_demo::sink::{LogSink, WriterSink};

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Activate,
    Pattern,
    Sequence(SequenceKind),
    Format,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate" => Ok(Command::Activate),
            "pattern" => Ok(Command::Pattern),
            "normal" => Ok(Command::Sequence(SequenceKind::Normal)),
            "anomaly" => Ok(Command::Sequence(SequenceKind::Anomaly)),
            "format" => Ok(Command::Format),
            other => Err(format!(
                "unknown command '{}', expected one of: activate, pattern, normal, anomaly, format",
                other
            )),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let command = match std::env::args().nth(1).as_deref().map(Command::from_str) {
        Some(Ok(command)) => command,
        Some(Err(e)) => {
            error!(error = %e, "Invalid command");
            std::process::exit(2);
        }
        None => {
            error!("Usage: a2g-demo <activate|pattern|normal|anomaly|format>");
            std::process::exit(2);
        }
    };

    let config = Config::from_env();

    // User-facing lines go to stdout; tracing output stays subject to RUST_LOG
    let sink = WriterSink::stdout();

    if command == Command::Format {
        let formatted = pretty_print_json(&config.json_body, &sink);
        sink.append(formatted);
        return;
    }

    let endpoints = match EndpointConfig::from_env() {
        Ok(endpoints) => {
            info!(
                base_url = %endpoints.base_url,
                timeout_secs = endpoints.request_timeout.as_secs(),
                "Configuration loaded"
            );
            endpoints
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let client = match HttpDeliveryClient::new(&endpoints) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        }
    };

    let generator = Arc::new(TelemetryGenerator::new(client.clone(), &endpoints));

    match command {
        Command::Activate => {
            generator.trigger_activation(&config, &sink).await;
        }
        Command::Pattern => {
            generator.send_pattern_payload(&config, &sink).await;
        }
        Command::Sequence(kind) => {
            run_sequence(generator, config, kind, &sink).await;
        }
        Command::Format => {}
    }

    let stats = client.stats();
    info!(
        delivered = stats.delivered,
        rejected = stats.rejected,
        transport_failures = stats.transport_failures,
        "A2G Demo finished"
    );
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Run one sequence in the background, relaying its lines until it ends or
/// Ctrl+C is pressed.
async fn run_sequence(
    generator: Arc<TelemetryGenerator<HttpDeliveryClient>>,
    config: Config,
    kind: SequenceKind,
    sink: &dyn LogSink,
) {
    info!(kind = %kind, "Starting sequence. Press Ctrl+C to stop.");
    let mut handle = spawn_sequence(generator, config, kind);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            line = handle.lines.recv() => match line {
                Some(line) => sink.append(line),
                None => break,
            },
            signal = &mut ctrl_c, if !interrupted => {
                if let Err(e) = signal {
                    error!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Shutdown signal received, stopping sequence...");
                interrupted = true;
                handle.cancel();
            }
        }
    }

    match handle.task.await {
        Ok(report) if report.state == SequenceState::Completed => {
            info!(
                attempts = report.attempts,
                succeeded = report.succeeded,
                failed = report.failed,
                "Sequence completed"
            );
        }
        Ok(report) => {
            warn!(attempts = report.attempts, "Sequence cancelled");
        }
        Err(e) => {
            warn!(error = %e, "Sequence task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!("activate".parse::<Command>(), Ok(Command::Activate));
        assert_eq!("pattern".parse::<Command>(), Ok(Command::Pattern));
        assert_eq!(
            "normal".parse::<Command>(),
            Ok(Command::Sequence(SequenceKind::Normal))
        );
        assert_eq!(
            "anomaly".parse::<Command>(),
            Ok(Command::Sequence(SequenceKind::Anomaly))
        );
        assert_eq!("format".parse::<Command>(), Ok(Command::Format));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = "explode".parse::<Command>().unwrap_err();
        assert!(err.contains("unknown command 'explode'"));
    }
}
