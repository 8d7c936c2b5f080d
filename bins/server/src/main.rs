mod config;
mod error;

use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use config::{Cli, Commands};
use error::ServerError;

mod cmd;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ServerError> {
    let runtime = build_runtime(cli.command.service_name(), cli.workers)?;
    runtime.block_on(async move {
        match cli.command {
            Commands::Echo(args) => cmd::echo::run(args).await,
            Commands::Aggregate(args) => cmd::aggregate::run(args).await,
        }
    })
}

/// Multi-thread runtime с именованными потоками `<service>-worker-<n>`,
/// чтобы echo мог сообщить, какой поток обработал запрос.
fn build_runtime(
    service: &'static str,
    workers: Option<usize>,
) -> Result<tokio::runtime::Runtime, ServerError> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name_fn(move || {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        format!("{service}-worker-{n}")
    });

    match workers {
        Some(0) => {
            return Err(ServerError::Config {
                context: "workers",
                detail: "must be greater than zero".to_string(),
            });
        }
        Some(n) => {
            builder.worker_threads(n);
        }
        None => {}
    }

    builder.build().map_err(ServerError::Runtime)
}
