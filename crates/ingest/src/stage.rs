use crate::cli::{Entity, Mode, RunArgs, ShowArgs};
use anyhow::{ensure, Context};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use stg_data_client::reqwest::RpcDataSource;
use stg_ingest::metrics::register_metrics;
use stg_ingest::server::run_server;
use stg_ingest::{IngestionUnit, Orchestrator, RateLimiter};
use stg_store::{create_store, StagingArea};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};


pub async fn run(
    args: &RunArgs,
    prom_port: Option<u16>,
    cancel: CancellationToken
) -> anyhow::Result<()>
{
    ensure!(
        args.first_block <= args.last_block,
        "--first-block is greater than --last-block"
    );

    let store = create_store(&args.store.dest, &args.store.s3_settings())
        .await
        .context("failed to create object store")?;

    let source = RpcDataSource::from_url(args.rpc_url.clone())
        .context("failed to create RPC client")?
        .with_max_attempts(args.rpc_attempts);

    let limiter = match args.mode {
        Mode::Stage => RateLimiter::unbounded(),
        Mode::Load => RateLimiter::new(args.rate_limit, args.burst)
    };

    let stop_server = cancel.child_token();
    if let Some(port) = prom_port {
        let mut registry = Registry::default();
        register_metrics(&mut registry);
        let stop = stop_server.clone();
        tokio::spawn(async move {
            if let Err(err) = run_server(registry, port, stop).await {
                error!(error =? err, "metrics server failed");
            }
        });
    }

    let unit = IngestionUnit::new(
        Arc::new(source),
        StagingArea::new(store),
        Arc::new(limiter)
    );

    let mut orchestrator = Orchestrator::new(unit);
    if let Some(workers) = args.workers {
        orchestrator = orchestrator.with_workers(workers);
    }

    info!(
        mode = ?args.mode,
        dest = %args.store.dest,
        "staging blocks {}..={}",
        args.first_block,
        args.last_block
    );

    let result = orchestrator.run_range(args.first_block, args.last_block, &cancel).await;
    stop_server.cancel();

    let report = result?;
    info!(
        "done: {} blocks staged, {} already staged",
        report.staged,
        report.skipped
    );
    Ok(())
}


pub async fn show(args: &ShowArgs) -> anyhow::Result<()> {
    let store = create_store(&args.store.dest, &args.store.s3_settings())
        .await
        .context("failed to create object store")?;

    let staging = StagingArea::new(store);

    let json = match &args.entity {
        Entity::Block { number } => {
            let block = staging.read_block(*number)
                .await
                .with_context(|| format!("failed to read block {}", number))?;
            serde_json::to_string_pretty(&block)?
        },
        Entity::Receipt { tx_hash } => {
            let receipt = staging.read_receipt(tx_hash)
                .await
                .with_context(|| format!("failed to read receipt of {}", tx_hash))?;
            serde_json::to_string_pretty(&receipt)?
        },
        Entity::Code { address } => {
            let code = staging.read_address_code(address)
                .await
                .with_context(|| format!("failed to read code of {}", address))?;
            serde_json::to_string_pretty(&code)?
        }
    };

    println!("{}", json);
    Ok(())
}
