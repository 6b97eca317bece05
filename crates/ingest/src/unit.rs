use crate::error::{Cancelled, IngestError, IngestFailure};
use crate::limiter::RateLimiter;
use crate::metrics;
use std::future::Future;
use std::sync::Arc;
use stg_data_client::{DataSourceRef, FetchError};
use stg_primitives::walker::{addresses, transaction_hashes};
use stg_primitives::{BlockNumber, StagingPath};
use stg_store::StagingArea;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Ingested {
    /// The block was already staged, nothing was fetched or written.
    Skipped,
    Staged {
        receipts: usize,
        address_codes: usize
    },
}


/// Stages one block together with its receipts and the code of every
/// address taking part in its transactions.
///
/// Work inside a block is strictly sequential and in source order.
#[derive(Clone)]
pub struct IngestionUnit {
    source: DataSourceRef,
    staging: StagingArea,
    limiter: Arc<RateLimiter>,
}


impl IngestionUnit {
    pub fn new(source: DataSourceRef, staging: StagingArea, limiter: Arc<RateLimiter>) -> Self {
        Self {
            source,
            staging,
            limiter
        }
    }

    #[instrument(name = "block", skip(self, cancel))]
    pub async fn process(
        &self,
        block_number: BlockNumber,
        cancel: &CancellationToken
    ) -> Result<Ingested, IngestError>
    {
        let result = self.stage(block_number, cancel).await;

        match &result {
            Ok(Ingested::Skipped) => metrics::BLOCKS_SKIPPED.inc(),
            Ok(Ingested::Staged { .. }) => metrics::BLOCKS_STAGED.inc(),
            Err(_) => metrics::BLOCKS_FAILED.inc()
        };

        result.map_err(|cause| IngestError {
            block_number,
            cause
        })
    }

    async fn stage(
        &self,
        block_number: BlockNumber,
        cancel: &CancellationToken
    ) -> Result<Ingested, IngestFailure>
    {
        let block_path = StagingPath::block(block_number);

        let is_staged = self.staging.is_staged(&block_path)
            .await
            .map_err(IngestFailure::ExistenceCheck)?;

        if is_staged {
            debug!("already staged, skipping");
            return Ok(Ingested::Skipped)
        }

        let block = self.fetch(cancel, self.source.get_block(block_number))
            .await?
            .map_err(IngestFailure::BlockFetch)?;

        self.staging.write_block(block_number, &block)
            .await
            .map_err(IngestFailure::BlockWrite)?;

        let mut receipts = 0;
        let mut address_codes = 0;

        for tx_hash in transaction_hashes(&block) {
            let receipt = self.fetch(cancel, self.source.get_transaction_receipt(tx_hash))
                .await?
                .map_err(|error| IngestFailure::ReceiptFetch {
                    tx_hash: tx_hash.to_string(),
                    error
                })?;

            self.staging.write_receipt(tx_hash, &receipt)
                .await
                .map_err(|error| IngestFailure::ReceiptWrite {
                    tx_hash: tx_hash.to_string(),
                    error
                })?;

            receipts += 1;

            for address in addresses(&receipt) {
                let code = self.fetch(cancel, self.source.get_address_code(address))
                    .await?
                    .map_err(|error| IngestFailure::CodeFetch {
                        address: address.to_string(),
                        error
                    })?;

                self.staging.write_address_code(&code)
                    .await
                    .map_err(|error| IngestFailure::CodeWrite {
                        address: address.to_string(),
                        error
                    })?;

                address_codes += 1;
            }
        }

        debug!(
            block = %block.ptr(),
            receipts,
            address_codes,
            "staged"
        );

        Ok(Ingested::Staged {
            receipts,
            address_codes
        })
    }

    /// Waits for a rate permit and runs a single data source call.
    ///
    /// Both the wait and the call give way to cancellation.
    async fn fetch<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, FetchError>>
    ) -> Result<Result<T, FetchError>, Cancelled>
    {
        let _permit = self.limiter.acquire(cancel).await?;
        metrics::RPC_CALLS.inc();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            result = call => Ok(result)
        }
    }
}
