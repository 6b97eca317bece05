use stg_data_client::FetchError;
use stg_primitives::BlockNumber;
use stg_store::{StagingError, StoreError};
use std::fmt::{Display, Formatter};


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Cancelled;


impl Display for Cancelled {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation was cancelled")
    }
}


impl std::error::Error for Cancelled {}


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InvalidRange {
    pub first_block: BlockNumber,
    pub last_block: BlockNumber
}


impl Display for InvalidRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid block range: first block {} is greater than last block {}",
            self.first_block,
            self.last_block
        )
    }
}


impl std::error::Error for InvalidRange {}


/// The step of a block's ingestion that failed.
#[derive(Debug)]
pub enum IngestFailure {
    ExistenceCheck(StoreError),
    BlockFetch(FetchError),
    BlockWrite(StagingError),
    ReceiptFetch {
        tx_hash: String,
        error: FetchError
    },
    ReceiptWrite {
        tx_hash: String,
        error: StagingError
    },
    CodeFetch {
        address: String,
        error: FetchError
    },
    CodeWrite {
        address: String,
        error: StagingError
    },
    Cancelled,
}


impl IngestFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestFailure::Cancelled)
    }
}


impl From<Cancelled> for IngestFailure {
    fn from(_: Cancelled) -> Self {
        IngestFailure::Cancelled
    }
}


impl Display for IngestFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestFailure::ExistenceCheck(err) => write!(f, "existence check failed: {}", err),
            IngestFailure::BlockFetch(err) => write!(f, "block fetch failed: {}", err),
            IngestFailure::BlockWrite(err) => write!(f, "block write failed: {}", err),
            IngestFailure::ReceiptFetch { tx_hash, error } => {
                write!(f, "receipt fetch failed for tx {}: {}", tx_hash, error)
            },
            IngestFailure::ReceiptWrite { tx_hash, error } => {
                write!(f, "receipt write failed for tx {}: {}", tx_hash, error)
            },
            IngestFailure::CodeFetch { address, error } => {
                write!(f, "address code fetch failed for {}: {}", address, error)
            },
            IngestFailure::CodeWrite { address, error } => {
                write!(f, "address code write failed for {}: {}", address, error)
            },
            IngestFailure::Cancelled => write!(f, "cancelled")
        }
    }
}


impl std::error::Error for IngestFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestFailure::ExistenceCheck(err) => Some(err),
            IngestFailure::BlockFetch(err) => Some(err),
            IngestFailure::BlockWrite(err) => Some(err),
            IngestFailure::ReceiptFetch { error, .. } => Some(error),
            IngestFailure::ReceiptWrite { error, .. } => Some(error),
            IngestFailure::CodeFetch { error, .. } => Some(error),
            IngestFailure::CodeWrite { error, .. } => Some(error),
            IngestFailure::Cancelled => None
        }
    }
}


#[derive(Debug)]
pub struct IngestError {
    pub block_number: BlockNumber,
    pub cause: IngestFailure
}


impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "block {}: {}", self.block_number, self.cause)
    }
}


impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BatchErrorKind {
    /// The run was stopped before every block was attempted.
    Cancelled,
    /// Some blocks failed, others were staged or skipped.
    PartiallyFailed,
    /// Every block of the range failed.
    Failed,
}


/// Outcome of a batch that did not stage the whole range.
///
/// Carries every per-block error, sorted by block number, so the
/// failed blocks can be re-run exactly.
#[derive(Debug)]
pub struct BatchError {
    pub kind: BatchErrorKind,
    pub first_block: BlockNumber,
    pub last_block: BlockNumber,
    /// Blocks staged by this run before it ended.
    pub staged: u64,
    /// Blocks found already staged.
    pub skipped: u64,
    pub failed: Vec<IngestError>,
}


impl BatchError {
    /// Number of blocks in the batch range.
    pub fn total(&self) -> u64 {
        (self.last_block - self.first_block).saturating_add(1)
    }

    pub fn failed_blocks(&self) -> Vec<BlockNumber> {
        self.failed.iter().map(|e| e.block_number).collect()
    }
}


impl Display for BatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            BatchErrorKind::Cancelled => write!(
                f,
                "staging of blocks {}..={} was cancelled",
                self.first_block,
                self.last_block
            )?,
            BatchErrorKind::PartiallyFailed => write!(
                f,
                "{} block(s) of {}..={} failed to stage",
                self.failed.len(),
                self.first_block,
                self.last_block
            )?,
            BatchErrorKind::Failed => write!(
                f,
                "all blocks of {}..={} failed to stage",
                self.first_block,
                self.last_block
            )?
        }
        write!(f, " ({} staged, {} already staged)", self.staged, self.skipped)?;
        for err in self.failed.iter() {
            write!(f, "\n  {}", err)?;
        }
        Ok(())
    }
}


impl std::error::Error for BatchError {}


#[derive(Debug)]
pub enum RunError {
    InvalidRange(InvalidRange),
    Batch(BatchError),
}


impl From<InvalidRange> for RunError {
    fn from(value: InvalidRange) -> Self {
        RunError::InvalidRange(value)
    }
}


impl From<BatchError> for RunError {
    fn from(value: BatchError) -> Self {
        RunError::Batch(value)
    }
}


impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::InvalidRange(err) => err.fmt(f),
            RunError::Batch(err) => err.fmt(f)
        }
    }
}


impl std::error::Error for RunError {}
