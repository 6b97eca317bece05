use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;


lazy_static::lazy_static! {
    pub static ref PROGRESS: Gauge<f64, AtomicU64> = Default::default();
    pub static ref BLOCKS_STAGED: Counter = Default::default();
    pub static ref BLOCKS_SKIPPED: Counter = Default::default();
    pub static ref BLOCKS_FAILED: Counter = Default::default();
    pub static ref RPC_CALLS: Counter = Default::default();
}


pub fn register_metrics(registry: &mut Registry) {
    registry.register(
        "stg_progress_blocks_per_second",
        "Overall block processing speed",
        PROGRESS.clone()
    );
    registry.register(
        "stg_blocks_staged",
        "Blocks fetched and written together with their receipts and address codes",
        BLOCKS_STAGED.clone()
    );
    registry.register(
        "stg_blocks_skipped",
        "Blocks skipped because they were already staged",
        BLOCKS_SKIPPED.clone()
    );
    registry.register(
        "stg_blocks_failed",
        "Blocks which failed to stage",
        BLOCKS_FAILED.clone()
    );
    registry.register(
        "stg_rpc_calls",
        "Data source calls admitted by the rate limiter",
        RPC_CALLS.clone()
    );
}
