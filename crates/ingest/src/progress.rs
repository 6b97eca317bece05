use crate::metrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;


fn blocks_per_second(blocks: u64, elapsed: Duration) -> f64 {
    if elapsed.is_zero() {
        0.0
    } else {
        blocks as f64 / elapsed.as_secs_f64()
    }
}


/// Logs batch progress every `interval` until `stop` fires.
///
/// The reported speed covers the last interval only.
pub async fn report_progress(
    done: Arc<AtomicU64>,
    total: u64,
    interval: Duration,
    stop: CancellationToken
) {
    let mut last_done = done.load(Ordering::Relaxed);
    let mut last_time = Instant::now();
    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let current = done.load(Ordering::Relaxed);
        let now = Instant::now();
        let speed = blocks_per_second(current.saturating_sub(last_done), now - last_time);
        last_done = current;
        last_time = now;

        metrics::PROGRESS.set(speed);

        info!(
            "processed {} of {} blocks, progress: {} blocks/sec",
            current,
            total,
            speed.round()
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn speed_of_an_interval() {
        assert_eq!(blocks_per_second(50, Duration::from_secs(5)), 10.0);
        assert_eq!(blocks_per_second(3, Duration::from_millis(500)), 6.0);
        assert_eq!(blocks_per_second(7, Duration::ZERO), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_request() {
        let done = Arc::new(AtomicU64::new(0));
        let stop = CancellationToken::new();
        let reporter = tokio::spawn(report_progress(
            done.clone(),
            100,
            Duration::from_secs(5),
            stop.clone()
        ));

        done.store(40, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert!(!reporter.is_finished());

        stop.cancel();
        tokio::time::timeout(Duration::from_secs(1), reporter)
            .await
            .unwrap()
            .unwrap();
    }
}
