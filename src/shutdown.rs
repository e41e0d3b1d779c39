use tokio_util::sync::CancellationToken;

/// Install a shutdown handler for SIGINT and, on unix, SIGTERM.
///
/// Returns a `CancellationToken` that is cancelled when a signal is
/// received. The dispatch pipeline's run loop watches this token and stops
/// accepting selection events; firings already in flight keep running until
/// their own terminal signals.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::error!(error = %err, "failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("received SIGINT, initiating shutdown");
                }
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to install ctrl-c handler");
                return;
            }
            tracing::info!("received ctrl-c, initiating shutdown");
        }

        trigger.cancel();
    });

    token
}
