//! SimBridge CLI - run the host/hub bridge from the command line.
//!
//! The login collaborator produces the bearer token; this binary only parses
//! arguments, bootstraps logging, constructs the bridge, and waits for
//! ctrl-c.

use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::error;

use simbridge::bridge::Bridge;
use simbridge::config::{BridgeConfig, DEFAULT_HOST_ADDR, DEFAULT_HUB_URL};
use simbridge::logging::{default_log_dir, default_log_file, init_logging};

#[derive(Parser)]
#[command(name = "simbridge")]
#[command(version = simbridge::VERSION)]
#[command(about = "Bridge a local flight simulator to a remote realtime hub", long_about = None)]
struct Args {
    /// WebSocket endpoint of the remote hub
    #[arg(long, default_value = DEFAULT_HUB_URL)]
    hub_url: String,

    /// Bearer token for the hub connection
    #[arg(long)]
    token: String,

    /// UDP endpoint of the local simulator host
    #[arg(long, default_value = DEFAULT_HOST_ADDR)]
    host_addr: String,

    /// Interval between telemetry polls, in milliseconds
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// Bound on the wait for each telemetry answer, in milliseconds
    #[arg(long, default_value = "800")]
    sample_timeout_ms: u64,

    /// Skip publishing while the simulation is paused
    #[arg(long)]
    suppress_publish_while_paused: bool,

    /// Reject the legacy one-bool brake payload
    #[arg(long)]
    strict_brake_payload: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging unavailable: {e}");
            None
        }
    };

    let mut config = BridgeConfig::new(args.hub_url, &args.token);
    config.host_addr = args.host_addr;
    config.poll_interval = Duration::from_millis(args.poll_interval_ms);
    config.sample_timeout = Duration::from_millis(args.sample_timeout_ms);
    config.suppress_publish_while_paused = args.suppress_publish_while_paused;
    config.legacy_single_brake = !args.strict_brake_payload;

    let bridge = match Bridge::start(config).await {
        Ok(bridge) => bridge,
        Err(e) => {
            error!(error = %e, "bridge failed to start");
            process::exit(1);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }

    bridge.shutdown().await;
}
