//! `heavylift-server` entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use heavylift_server::network::{NetworkConfig, NetworkModule};
use heavylift_server::observability::{
    init_logging, install_prometheus_recorder, LogFormat, MetricsCounters, TracingTracer,
};
use heavylift_server::service::{build_pipeline_service, PipelineConfig, PipelineOrchestrator};
use tracing::{info, warn};

const SERVICE_NAME: &str = "heavylift";

#[derive(Parser, Debug)]
#[command(name = "heavylift-server", version, about = "Prime search, nap, and parallel pi approximation over HTTP")]
struct Cli {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 picks an ephemeral port)
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Font colour of the result page
    #[arg(long, env = "COLOUR", default_value = "blue")]
    colour: String,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Longest accepted nap, in seconds
    #[arg(long, env = "MAX_DELAY_SECS", default_value_t = 10)]
    max_delay_secs: u64,

    /// Largest accepted prime search bound
    #[arg(long, env = "SIEVE_CAPACITY", default_value_t = heavylift_core::SIEVE_CAPACITY)]
    sieve_capacity: usize,

    /// Maximum number of series terms evaluated concurrently
    #[arg(long, env = "MAX_CONCURRENT_TERMS", default_value_t = 1024)]
    max_concurrent_terms: usize,

    /// Maximum number of pipelines running at once; extra requests get 503
    #[arg(long, env = "MAX_CONCURRENT_PIPELINES", default_value_t = 4)]
    max_concurrent_pipelines: u32,

    /// Optional deadline for the approximation stage, in seconds
    #[arg(long, env = "AGGREGATE_DEADLINE_SECS")]
    aggregate_deadline_secs: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Allowed CORS origins (comma-separated, `*` for any)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sieve_capacity: self.sieve_capacity,
            max_delay_secs: self.max_delay_secs,
            max_concurrent_terms: self.max_concurrent_terms,
            aggregate_deadline: self.aggregate_deadline_secs.map(Duration::from_secs),
            max_concurrent_pipelines: self.max_concurrent_pipelines,
        }
    }

    fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            colour: self.colour.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format)?;

    info!("########################################");
    info!("  {SERVICE_NAME} v{}", env!("CARGO_PKG_VERSION"));
    info!("########################################");

    let pipeline_config = cli.pipeline_config();
    let network_config = cli.network_config();
    if network_config.request_timeout <= Duration::from_secs(pipeline_config.max_delay_secs) {
        warn!(
            request_timeout_secs = cli.request_timeout_secs,
            max_delay_secs = cli.max_delay_secs,
            "request timeout does not exceed the longest nap; long pipelines will time out"
        );
    }

    let metrics = install_prometheus_recorder()?;

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        &pipeline_config,
        Arc::new(TracingTracer::new(SERVICE_NAME)),
        Arc::new(MetricsCounters),
    ));
    let pipeline = build_pipeline_service(orchestrator, &pipeline_config);

    let mut network = NetworkModule::new(network_config, pipeline, Some(metrics));
    let port = network.start().await?;
    info!(
        host = %cli.host,
        port,
        colour = %cli.colour,
        sieve_capacity = pipeline_config.sieve_capacity,
        "listening"
    );

    network
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await
}
