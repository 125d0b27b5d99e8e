//! Process-level entry point: wires the capabilities together, runs the scan
//! loop in the background and performs the stop handshake on termination.

use std::future::Future;
use tracing::{error, info};

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::{Result, WatchError};
use crate::notifier::{HttpTransport, Notifier, WebhookTransport};
use crate::rcon::{Connector, TcpConnector};
use crate::scan::ScanLoop;
use crate::shutdown::shutdown_channel;

/// Run against the real TCP console and HTTP webhook until `termination`
/// resolves.
pub async fn run<F>(config: Config, termination: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;

    let connector = TcpConnector::new(config.io_timeout());
    let transport = HttpTransport::new(config.webhook_timeout())?;
    run_with(&config, Box::new(connector), Box::new(transport), termination).await
}

pub async fn run_with<F>(
    config: &Config,
    connector: Box<dyn Connector>,
    transport: Box<dyn WebhookTransport>,
    termination: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let connection =
        ConnectionManager::new(connector, &config.rcon.address, &config.rcon.password);
    let notifier = Notifier::new(transport, &config.webhook.url);
    let mut scan = ScanLoop::new(connection, notifier, config.interval());

    let (handle, listener) = shutdown_channel();
    info!(
        address = %config.rcon.address,
        interval = ?config.interval(),
        "starting scan loop"
    );
    let task = tokio::spawn(async move { scan.run(listener).await });

    termination.await;
    info!("termination requested, waiting for scan loop");
    handle.shutdown().await?;

    task.await
        .map_err(|e| WatchError::Shutdown(format!("scan task failed: {}", e)))?;
    info!("scan loop stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
