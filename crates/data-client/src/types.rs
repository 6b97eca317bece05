use async_trait::async_trait;
use stg_primitives::{AddressCode, Block, BlockNumber, TransactionReceipt};
use std::fmt::{Display, Formatter};
use std::sync::Arc;


pub type DataSourceRef = Arc<dyn DataSource + Send + Sync>;


/// Remote source of ledger entities.
///
/// Address code is always resolved against the current chain head,
/// not against the block the address was found in.
#[async_trait]
pub trait DataSource {
    async fn get_block(&self, number: BlockNumber) -> Result<Block, FetchError>;

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, FetchError>;

    async fn get_address_code(&self, address: &str) -> Result<AddressCode, FetchError>;
}


#[derive(Debug)]
pub enum FetchError {
    NotFound {
        method: &'static str,
        key: String
    },
    Rpc {
        code: i64,
        message: String
    },
    Decode(serde_json::Error),
    Transport(anyhow::Error),
}


impl FetchError {
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        FetchError::Transport(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}


impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound { method, key } => {
                write!(f, "{} returned nothing for {}", method, key)
            },
            FetchError::Rpc { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            },
            FetchError::Decode(err) => write!(f, "failed to decode RPC response: {}", err),
            FetchError::Transport(err) => write!(f, "RPC request failed: {:#}", err)
        }
    }
}


impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Decode(err) => Some(err),
            FetchError::Transport(err) => Some(err.as_ref()),
            _ => None
        }
    }
}
