use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Map;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stg_data_client::{DataSource, FetchError};
use stg_ingest::{IngestionUnit, RateLimiter};
use stg_primitives::{
    to_quantity, AddressCode, Block, BlockNumber, BlockTransaction, TransactionReceipt,
};
use stg_store::memory::MemoryStore;
use stg_store::{ObjectStore, StagingArea, StoreError, StoreRef};


pub const TXS_PER_BLOCK: usize = 2;


/// Fake chain where block `n` carries transactions `0xn_0`, `0xn_1`, ...
/// and every transaction goes from `0xfrom_<tx>` to `0xto_<tx>`.
#[derive(Default)]
pub struct FakeChain {
    pub block_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub code_calls: AtomicUsize,
    pub code_requests: Mutex<Vec<String>>,
    failing_blocks: HashSet<BlockNumber>,
    failing_receipts: HashSet<String>,
    fail_all: bool,
    shouting_receipts: bool,
    self_send: bool,
    hang: bool,
}


impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, block: BlockNumber) -> Self {
        self.failing_blocks.insert(block);
        self
    }

    pub fn failing_receipt(mut self, tx_hash: &str) -> Self {
        self.failing_receipts.insert(tx_hash.to_string());
        self
    }

    /// Receipts echo their transaction hash in upper case.
    pub fn shouting_receipts(mut self) -> Self {
        self.shouting_receipts = true;
        self
    }

    pub fn failing_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn self_sending(mut self) -> Self {
        self.self_send = true;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
            + self.receipt_calls.load(Ordering::SeqCst)
            + self.code_calls.load(Ordering::SeqCst)
    }
}


pub fn tx_hash(block: BlockNumber, index: usize) -> String {
    format!("0x{}_{}", block, index)
}


#[async_trait]
impl DataSource for FakeChain {
    async fn get_block(&self, number: BlockNumber) -> Result<Block, FetchError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);

        if self.hang {
            std::future::pending::<()>().await;
        }

        if self.fail_all || self.failing_blocks.contains(&number) {
            return Err(FetchError::Rpc {
                code: -32000,
                message: "header not found".to_string()
            })
        }

        Ok(Block {
            number: to_quantity(number),
            hash: format!("0xhash_{}", number),
            parent_hash: format!("0xhash_{}", number.saturating_sub(1)),
            timestamp: None,
            transactions: (0..TXS_PER_BLOCK)
                .map(|i| BlockTransaction::Hash(tx_hash(number, i)))
                .collect(),
            rest: Map::new()
        })
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, FetchError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_receipts.contains(tx_hash) {
            return Err(FetchError::transport(anyhow::anyhow!("connection reset")))
        }

        let from = format!("0xfrom_{}", tx_hash);
        let to = if self.self_send {
            from.clone()
        } else {
            format!("0xto_{}", tx_hash)
        };

        let transaction_hash = if self.shouting_receipts {
            tx_hash.to_uppercase()
        } else {
            tx_hash.to_string()
        };

        Ok(TransactionReceipt {
            transaction_hash,
            block_number: None,
            from,
            to: Some(to),
            contract_address: None,
            rest: Map::new()
        })
    }

    async fn get_address_code(&self, address: &str) -> Result<AddressCode, FetchError> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        self.code_requests.lock().push(address.to_string());
        Ok(AddressCode {
            address: address.to_string(),
            address_code: "0x".to_string()
        })
    }
}


/// Memory store refusing to write any path containing `needle`.
pub struct FailingStore {
    pub inner: Arc<MemoryStore>,
    needle: String,
}


impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>, needle: &str) -> Self {
        Self {
            inner,
            needle: needle.to_string()
        }
    }
}


#[async_trait]
impl ObjectStore for FailingStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        self.inner.exists(path).await
    }

    async fn put(&self, path: &str, value: Bytes) -> Result<(), StoreError> {
        if path.contains(&self.needle) {
            return Err(StoreError::transport(anyhow::anyhow!("disk full")))
        }
        self.inner.put(path, value).await
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        self.inner.get(path).await
    }
}


pub struct Setup {
    pub chain: Arc<FakeChain>,
    pub store: Arc<MemoryStore>,
    pub unit: IngestionUnit,
}


pub fn setup(chain: FakeChain) -> Setup {
    setup_with_limiter(chain, RateLimiter::unbounded())
}


pub fn setup_with_limiter(chain: FakeChain, limiter: RateLimiter) -> Setup {
    let store = Arc::new(MemoryStore::new());
    build(chain, store.clone(), store, limiter)
}


/// Writes of paths containing `needle` fail, everything else lands in `store`.
pub fn setup_failing_writes(chain: FakeChain, needle: &str) -> Setup {
    let store = Arc::new(MemoryStore::new());
    let failing = Arc::new(FailingStore::new(store.clone(), needle));
    build(chain, store, failing, RateLimiter::unbounded())
}


fn build(chain: FakeChain, store: Arc<MemoryStore>, target: StoreRef, limiter: RateLimiter) -> Setup {
    let chain = Arc::new(chain);
    let unit = IngestionUnit::new(
        chain.clone(),
        StagingArea::new(target),
        Arc::new(limiter)
    );
    Setup {
        chain,
        store,
        unit
    }
}
