//! `feed_server` binary.

use anyhow::Context;
use clap::Parser;
use feed_server::config::{build_config, CliArgs, ServerConfig};
use feed_server::server::Server;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Streams synthetic and upstream market prices to WebSocket and SSE clients
#[derive(Parser, Debug)]
#[command(name = "feed_server", version, about)]
struct Opts {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "TICKSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "TICKSTREAM_HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "TICKSTREAM_PORT")]
    port: Option<u16>,

    /// trace, debug, info, warn or error
    #[arg(long, env = "TICKSTREAM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Fixed seed for price paths and bars
    #[arg(long, env = "TICKSTREAM_SEED")]
    seed: Option<u64>,

    /// Validate the configuration, print it and exit
    #[arg(long)]
    check_config: bool,
}

impl Opts {
    fn cli_args(&self) -> CliArgs {
        CliArgs {
            config_file: self.config.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            seed: self.seed,
        }
    }
}

/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_startup(config: &ServerConfig) {
    tracing::info!(version = feed_server::VERSION, "tickstream feed server");
    tracing::info!(
        address = %config.socket_addr(),
        environment = %config.environment,
        tick_interval_ms = config.stream.tick_interval_ms,
        cache_ttl_secs = config.sources.cache_ttl_secs,
        seeded = config.synthesis.seed.is_some(),
        indices_upstream = config.sources.indices_primary_url.is_some(),
        flow_upstream = config.sources.flow_primary_url.is_some(),
        "configuration loaded"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    let config = build_config(&opts.cli_args()).context("invalid configuration")?;

    if opts.check_config {
        let rendered = toml::to_string_pretty(&config).context("failed to render configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    init_tracing(config.log_level.as_filter_str());
    log_startup(&config);

    Server::new(config)
        .context("failed to build server state")?
        .run()
        .await
        .context("server error")
}
