//! FieldLink node service
//!
//! Wires the sampling and location workers to simulated hardware, a logging
//! transport and a simulated platform that requests data on demand, then
//! runs until interrupted.

use anyhow::{bail, Context};
use fieldlink_core::{logging, Config, DeliveryChannel, StopSignal, SystemClock};
use fieldlink_location::{
    FallbackSource, GnssSource, LbsSource, LocationReporter, LocationSettings, GNSS_READ_ATTEMPTS, GNSS_RETRY_PAUSE,
};
use fieldlink_sensors::SensorRegistry;
use fieldlink_telemetry::{SamplingLoop, SamplingSettings, DEFAULT_QUEUE_CAPACITY};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod sim;

use sim::{LoggingTransport, SimulatedDevice, SimulatedModem, SimulatedPlatform};

const NODE_PROTOCOL_VERSION: u32 = 1;
const NODE_RUNTIME_VERSION: u32 = 1;
/// Pending on-demand location reports.
const LOCATION_QUEUE_CAPACITY: usize = 4;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    runtime_version: u32,
    protocol_version: u32,
}

#[derive(Debug, PartialEq)]
struct NodeArgs {
    config: Option<PathBuf>,
    failure_rate: f64,
    seed: u64,
    /// Seconds between simulated platform requests; 0 disables them
    platform_interval_secs: u64,
}

impl Default for NodeArgs {
    fn default() -> Self {
        Self {
            config: None,
            failure_rate: 0.1,
            seed: 42,
            platform_interval_secs: 300,
        }
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<NodeArgs> {
    let mut parsed = NodeArgs::default();
    let mut args_iter = args.iter().skip(1);

    while let Some(arg) = args_iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = args_iter.next().context("--config was provided without a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--failure-rate" => {
                let value = args_iter.next().context("--failure-rate needs a value")?;
                let rate: f64 = value.parse().with_context(|| format!("invalid failure rate {value:?}"))?;
                if !(0.0..=1.0).contains(&rate) {
                    bail!("--failure-rate must be within 0.0..=1.0, got {rate}");
                }
                parsed.failure_rate = rate;
            }
            "--seed" => {
                let value = args_iter.next().context("--seed needs a value")?;
                parsed.seed = value.parse().with_context(|| format!("invalid seed {value:?}"))?;
            }
            "--platform-interval" => {
                let value = args_iter.next().context("--platform-interval needs a value")?;
                parsed.platform_interval_secs =
                    value.parse().with_context(|| format!("invalid platform interval {value:?}"))?;
            }
            other => bail!("unknown argument {other:?}"),
        }
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            runtime_version: NODE_RUNTIME_VERSION,
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let node_args = parse_args(&args)?;
    let config = match &node_args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default_config(),
    };

    logging::init_with_format(config.logging.format);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?node_args.config,
        failure_rate = node_args.failure_rate,
        "FieldLink node starting"
    );

    // One signal per worker: a nudge is consumed by whichever worker wakes first.
    let sampling_stop = StopSignal::new();
    let location_stop = StopSignal::new();
    let clock = Arc::new(SystemClock);
    let delivery = DeliveryChannel::with_max_attempts(
        LoggingTransport::new(node_args.failure_rate, node_args.seed),
        config.delivery.max_attempts,
    );

    let registry = SensorRegistry::with_devices(SimulatedDevice::fleet(node_args.seed));
    let (sampling, read_handle) = SamplingLoop::new(
        registry,
        delivery.clone(),
        clock.clone(),
        SamplingSettings::from_config(&config.sampling, config.delivery.frame_mode),
    )
    .with_stop_signal(sampling_stop.clone())
    .with_request_queue(DEFAULT_QUEUE_CAPACITY);

    let mut workers = vec![sampling.spawn()?];
    let mut location_handle = None;

    if config.location.enabled {
        let source = FallbackSource::new(
            GnssSource::new(SimulatedModem::new(node_args.seed)).with_retry(
                GNSS_READ_ATTEMPTS,
                GNSS_RETRY_PAUSE,
                clock.clone(),
            ),
            LbsSource::new(SimulatedModem::new(node_args.seed.wrapping_add(1))),
        );
        let (reporter, handle) = LocationReporter::new(
            Box::new(source),
            delivery,
            clock,
            LocationSettings::from(&config.location),
        )
        .with_stop_signal(location_stop.clone())
        .with_request_queue(LOCATION_QUEUE_CAPACITY);
        location_handle = Some(handle);
        workers.push(reporter.spawn()?);
    } else {
        info!("Location reporting disabled");
    }

    let platform = if node_args.platform_interval_secs > 0 {
        let platform = SimulatedPlatform::new(
            read_handle,
            location_handle,
            Duration::from_secs(node_args.platform_interval_secs),
        );
        Some(tokio::spawn(platform.run()))
    } else {
        info!("Simulated platform requests disabled");
        None
    };

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutdown requested, finishing current cycles");
    if let Some(platform) = platform {
        platform.abort();
    }
    sampling_stop.raise();
    location_stop.raise();

    for worker in workers {
        let name = worker.thread().name().unwrap_or("worker").to_string();
        tokio::task::spawn_blocking(move || worker.join())
            .await
            .context("joining worker")?
            .unwrap_or_else(|_| warn!(worker = %name, "Worker panicked"));
    }

    info!("FieldLink node stopped");
    Ok(())
}
