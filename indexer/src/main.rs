mod config;
mod db;
mod processor;
mod query;
mod watcher;

use bridge_core::chain::{ChainClient, EvmReadClient};
use config::IndexerConfig;
use processor::IndexerProcessor;
use std::sync::Arc;
use tokio::task::JoinSet;
use watcher::ChainWatcher;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    tracing::info!("starting bridge indexer");

    let config = IndexerConfig::load()?;
    tracing::info!(chain_count = config.chains.len(), "configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("database connected");

    db::run_migrations(&pool).await?;
    tracing::info!("database migrations complete");

    let processor = Arc::new(IndexerProcessor::new(pool.clone()));

    let mut watchers = JoinSet::new();
    let mut shutdown_senders = Vec::new();
    for chain in config.chains.clone() {
        let client: Arc<dyn ChainClient> =
            Arc::new(EvmReadClient::new(&chain.rpc_url).expect("valid RPC URL"));
        let pool = pool.clone();
        let processor = processor.clone();
        let (tx, rx) = tokio::sync::mpsc::channel::<()>(1);
        shutdown_senders.push(tx);
        let chain_name = chain.name.clone();
        watchers.spawn(async move {
            let watcher = ChainWatcher::new(chain, client, pool, processor);
            let result = watcher.run(rx).await;
            (chain_name, result)
        });
    }

    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        for tx in shutdown_senders {
            let _ = tx.send(()).await;
        }
    });

    tracing::info!("watchers started");

    while let Some(res) = watchers.join_next().await {
        match res {
            Ok((chain_name, Ok(()))) => {
                tracing::info!(chain = %chain_name, "watcher exited cleanly");
            }
            Ok((chain_name, Err(e))) => {
                tracing::error!(chain = %chain_name, error = %e, "watcher exited with error");
            }
            Err(e) => {
                tracing::error!(error = %e, "watcher task panicked");
            }
        }
    }

    tracing::info!("bridge indexer stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,indexer=debug,bridge_core=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, initiating shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, initiating shutdown"),
    }
}
