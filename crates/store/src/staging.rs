use crate::{StoreError, StoreRef};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stg_primitives::{AddressCode, Block, BlockNumber, StagingPath, TransactionReceipt};
use std::fmt::{Display, Formatter};


/// JSON view of an object store laid out by [`StagingPath`].
#[derive(Clone)]
pub struct StagingArea {
    store: StoreRef,
}


impl StagingArea {
    pub fn new(store: StoreRef) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StoreRef {
        &self.store
    }

    pub async fn is_staged(&self, path: &StagingPath) -> Result<bool, StoreError> {
        self.store.exists(path.as_str()).await
    }

    pub async fn write_block(&self, number: BlockNumber, block: &Block) -> Result<(), StagingError> {
        self.write(&StagingPath::block(number), block).await
    }

    /// Stores `receipt` under the hash it was requested by, whatever hash the node echoed back.
    pub async fn write_receipt(
        &self,
        tx_hash: &str,
        receipt: &TransactionReceipt
    ) -> Result<(), StagingError>
    {
        self.write(&StagingPath::receipt(tx_hash), receipt).await
    }

    pub async fn write_address_code(&self, code: &AddressCode) -> Result<(), StagingError> {
        self.write(&StagingPath::address_code(&code.address), code).await
    }

    pub async fn read_block(&self, number: BlockNumber) -> Result<Block, StagingError> {
        self.read(&StagingPath::block(number)).await
    }

    pub async fn read_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, StagingError> {
        self.read(&StagingPath::receipt(tx_hash)).await
    }

    pub async fn read_address_code(&self, address: &str) -> Result<AddressCode, StagingError> {
        self.read(&StagingPath::address_code(address)).await
    }

    async fn write<T: Serialize>(&self, path: &StagingPath, value: &T) -> Result<(), StagingError> {
        let json = serde_json::to_vec(value).map_err(StagingError::Json)?;
        self.store.put(path.as_str(), Bytes::from(json)).await?;
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, path: &StagingPath) -> Result<T, StagingError> {
        let bytes = self.store.get(path.as_str()).await?;
        serde_json::from_slice(&bytes).map_err(StagingError::Json)
    }
}


#[derive(Debug)]
pub enum StagingError {
    Store(StoreError),
    Json(serde_json::Error),
}


impl From<StoreError> for StagingError {
    fn from(value: StoreError) -> Self {
        StagingError::Store(value)
    }
}


impl Display for StagingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingError::Store(err) => err.fmt(f),
            StagingError::Json(err) => write!(f, "invalid JSON: {}", err)
        }
    }
}


impl std::error::Error for StagingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StagingError::Store(err) => err.source(),
            StagingError::Json(err) => Some(err)
        }
    }
}
