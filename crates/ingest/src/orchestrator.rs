use crate::error::{BatchError, BatchErrorKind, IngestError, InvalidRange, RunError};
use crate::progress::report_progress;
use crate::unit::{Ingested, IngestionUnit};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stg_primitives::BlockNumber;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};


/// Upper bound on the number of block numbers waiting in the work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BatchReport {
    pub first_block: BlockNumber,
    pub last_block: BlockNumber,
    pub staged: u64,
    pub skipped: u64,
}


#[derive(Default)]
struct WorkerStats {
    staged: u64,
    skipped: u64,
}


/// Stages inclusive block ranges with a fixed pool of workers.
pub struct Orchestrator {
    unit: IngestionUnit,
    workers: NonZeroUsize,
    queue_capacity: usize,
    progress_interval: Duration,
}


impl Orchestrator {
    pub fn new(unit: IngestionUnit) -> Self {
        Self {
            unit,
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress_interval: Duration::from_secs(5),
        }
    }

    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Stages every block of `first_block..=last_block`.
    ///
    /// A failed block never stops the others. The batch fails only after
    /// every block was attempted, or earlier if `cancel` fires.
    #[instrument(name = "batch", skip(self, cancel))]
    pub async fn run_range(
        &self,
        first_block: BlockNumber,
        last_block: BlockNumber,
        cancel: &CancellationToken
    ) -> Result<BatchReport, RunError>
    {
        if first_block > last_block {
            return Err(InvalidRange { first_block, last_block }.into())
        }

        let total = (last_block - first_block).saturating_add(1);
        let capacity = usize::try_from(total)
            .unwrap_or(usize::MAX)
            .min(self.queue_capacity);

        let (task_sender, task_receiver) = async_channel::bounded::<BlockNumber>(capacity);
        let (error_sender, mut error_receiver) = mpsc::unbounded_channel::<IngestError>();

        let done = Arc::new(AtomicU64::new(0));
        let stop_progress = CancellationToken::new();
        let progress = tokio::spawn(report_progress(
            done.clone(),
            total,
            self.progress_interval,
            stop_progress.clone()
        ));

        info!(
            workers = self.workers.get(),
            "staging {} blocks",
            total
        );

        let workers: Vec<_> = (0..self.workers.get()).map(|_| {
            let unit = self.unit.clone();
            let tasks = task_receiver.clone();
            let errors = error_sender.clone();
            let done = done.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut stats = WorkerStats::default();
                loop {
                    let block_number = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        task = tasks.recv() => match task {
                            Ok(block_number) => block_number,
                            Err(_) => break
                        }
                    };
                    match unit.process(block_number, &cancel).await {
                        Ok(Ingested::Skipped) => stats.skipped += 1,
                        Ok(Ingested::Staged { .. }) => stats.staged += 1,
                        Err(err) => {
                            if !err.cause.is_cancelled() {
                                warn!(block_number = err.block_number, error = %err.cause, "failed to stage block");
                            }
                            let _ = errors.send(err);
                        }
                    }
                    done.fetch_add(1, Ordering::Relaxed);
                }
                stats
            })
        }).collect();

        drop(task_receiver);
        drop(error_sender);

        let mut dispatched: u64 = 0;
        for block_number in first_block..=last_block {
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                res = task_sender.send(block_number) => res.is_ok()
            };
            if !sent {
                break
            }
            dispatched += 1;
        }
        task_sender.close();

        let mut report = BatchReport {
            first_block,
            last_block,
            staged: 0,
            skipped: 0
        };

        for worker in workers {
            match worker.await {
                Ok(stats) => {
                    report.staged += stats.staged;
                    report.skipped += stats.skipped;
                },
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => warn!(error = %err, "worker task was aborted")
            }
        }

        stop_progress.cancel();
        let _ = progress.await;

        let mut failed = Vec::new();
        while let Some(err) = error_receiver.recv().await {
            failed.push(err);
        }
        failed.sort_by_key(|err| err.block_number);

        let attempted = done.load(Ordering::Relaxed);
        let interrupted = attempted < total || failed.iter().any(|err| err.cause.is_cancelled());

        let kind = if cancel.is_cancelled() && interrupted {
            warn!(
                dispatched,
                attempted,
                "batch cancelled"
            );
            BatchErrorKind::Cancelled
        } else if failed.is_empty() {
            info!(
                staged = report.staged,
                skipped = report.skipped,
                "staged blocks {}..={}",
                first_block,
                last_block
            );
            return Ok(report)
        } else if failed.len() as u64 == total {
            BatchErrorKind::Failed
        } else {
            BatchErrorKind::PartiallyFailed
        };

        Err(BatchError {
            kind,
            first_block,
            last_block,
            staged: report.staged,
            skipped: report.skipped,
            failed
        }.into())
    }
}


pub fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
