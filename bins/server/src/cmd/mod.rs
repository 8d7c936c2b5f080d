pub mod aggregate;
pub mod echo;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ServerError;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Ждать Ctrl+C или падения сервера, затем остановить сервер и дать
/// ему до 5с на drain. Ошибка сервера возвращается вызывающему.
pub(crate) async fn wait_for_shutdown(
    token: CancellationToken,
    server: JoinHandle<std::io::Result<()>>,
) -> Result<(), ServerError> {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutting down...");
        }
        _ = token.cancelled() => {}
    }

    // Signal the server to stop accepting and finish in-flight requests
    token.cancel();

    let abort = server.abort_handle();
    match tokio::time::timeout(DRAIN_TIMEOUT, server).await {
        Ok(joined) => joined?.map_err(ServerError::Serve),
        Err(_) => {
            tracing::warn!("drain timeout, aborting server task");
            abort.abort();
            Ok(())
        }
    }
}
