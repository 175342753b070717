mod config;
mod db;
mod processor;
mod query;
mod reconcile;
mod watcher;

use bridge_core::chain::{ChainClient, EvmReadClient, EvmSubmitClient};
use bridge_core::signer::Signer;
use config::RelayerConfig;
use processor::RelayerProcessor;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
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

    tracing::info!("starting bridge relayer");

    let config = RelayerConfig::load()?;
    tracing::info!(chain_count = config.chains.len(), "configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("database connected");

    db::run_migrations(&pool).await?;
    tracing::info!("database migrations complete");

    let signer = Signer::from_private_key(&config.validator_private_key)?;
    tracing::info!(validator_address = %signer.address(), "validator signer ready");

    // Every configured chain can be a withdrawal target, so every chain gets a
    // submit-capable client. The same client also serves as that chain's
    // source-side watcher client.
    let mut submit_clients: HashMap<u64, Arc<dyn ChainClient>> = HashMap::new();
    for chain in &config.chains {
        let signer_key: alloy::signers::local::PrivateKeySigner =
            config.validator_private_key.parse()?;
        let client = EvmSubmitClient::new(&chain.rpc_url, signer_key)?;
        submit_clients.insert(chain.chain_id, Arc::new(client));
    }

    reconcile::reconcile_relaying_transactions(&pool, &config, &submit_clients).await?;

    let processor = Arc::new(RelayerProcessor::new(
        pool.clone(),
        submit_clients.clone(),
        signer,
        config.clone(),
    ));

    let mut watchers = JoinSet::new();
    let mut shutdown_senders = Vec::new();
    for chain in config.chains.clone() {
        let read_client: Arc<dyn ChainClient> = submit_clients
            .get(&chain.chain_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(EvmReadClient::new(&chain.rpc_url).expect("valid RPC URL")));
        let pool = pool.clone();
        let processor = processor.clone();
        let (tx, rx) = tokio::sync::mpsc::channel::<()>(1);
        shutdown_senders.push(tx);
        let chain_name = chain.name.clone();
        watchers.spawn(async move {
            let watcher = ChainWatcher::new(chain, read_client, pool, processor);
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

    let grace_period = Duration::from_secs(config.shutdown_grace_period_secs);
    let join_all = async {
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
    };

    if tokio::time::timeout(grace_period, join_all).await.is_err() {
        tracing::warn!(
            grace_period_secs = config.shutdown_grace_period_secs,
            remaining = watchers.len(),
            "shutdown grace period elapsed, aborting remaining watchers"
        );
        watchers.shutdown().await;
    }

    tracing::info!("bridge relayer stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,relayer=debug,bridge_core=debug"));

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
