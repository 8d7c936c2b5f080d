use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::EchoArgs;
use crate::error::ServerError;

pub async fn run(args: EchoArgs) -> Result<(), ServerError> {
    tracing::info!("echo service starting");

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;

    let token = CancellationToken::new();
    let server_token = token.clone();
    let server = tokio::spawn(async move {
        let result = echo_service::run(listener, server_token.clone()).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "echo server error");
            server_token.cancel();
        }
        result
    });

    tracing::info!(addr = %addr, "echo service listening");
    super::wait_for_shutdown(token, server).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
