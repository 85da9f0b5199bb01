mod bootstrap;
mod config;
mod transport;

use std::process::ExitCode;

use scene_bridge::CommandRouter;
use tracing::{error, info};

use crate::config::{HostConfig, TransportKind};
use crate::transport::{HostError, TcpLineServer};

fn main() -> ExitCode {
    bootstrap::init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "bridge_host_failed");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<(), HostError> {
    info!("=== Scene Bridge Startup ===");
    let config = HostConfig::from_env();
    info!(
        transport = ?config.transport,
        port = config.port,
        history_limit = config.history_limit,
        diagnostic_limit = config.diagnostic_limit,
        "bridge_config_loaded"
    );
    let mut router = CommandRouter::with_limits(
        bootstrap::demo_scene(),
        config.history_limit,
        config.diagnostic_limit,
    );

    match config.transport {
        TransportKind::Stdio => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            transport::serve_stdio(&mut router, stdin.lock(), stdout.lock())
        }
        TransportKind::Tcp => {
            let server = TcpLineServer::bind_localhost(config.port)?;
            server.serve(&mut router);
            Ok(())
        }
    }
}
