use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use aggregator_service::{AggregatorState, EchoClient};

use crate::config::{AggregateArgs, AggregatorConfig};
use crate::error::ServerError;

pub async fn run(args: AggregateArgs) -> Result<(), ServerError> {
    tracing::info!("aggregator starting");

    // --- Load config ---
    let config = AggregatorConfig::resolve(&args)?;
    tracing::info!(
        echo_url = %config.echo_url,
        timeout_ms = config.request_timeout.as_millis() as u64,
        storage = ?config.storage,
        "loaded config"
    );

    // --- Wire collaborators ---
    let storage = record_store::open_storage(&config.storage).await?;
    let client = EchoClient::new(&config.echo_url, config.request_timeout)?;
    let state = AggregatorState::new(Arc::new(client), storage.clone());

    // --- HTTP server ---
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;

    let token = CancellationToken::new();
    let server_token = token.clone();
    let server = tokio::spawn(async move {
        let result = aggregator_service::run(listener, state, server_token.clone()).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "aggregator server error");
            server_token.cancel();
        }
        result
    });

    tracing::info!(addr = %addr, "aggregator listening");
    let served = super::wait_for_shutdown(token, server).await;

    // Flush и после падения сервера.
    if let Err(e) = storage.flush().await {
        tracing::error!(error = %e, "storage flush error");
    }
    served?;

    tracing::info!("shutdown complete");
    Ok(())
}
