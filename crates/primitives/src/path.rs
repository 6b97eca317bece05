use crate::BlockNumber;
use std::fmt::{Display, Formatter};


pub const BLOCKS_DIR: &str = "blocks";
pub const RECEIPTS_DIR: &str = "transaction_receipts";
pub const ADDRESS_CODES_DIR: &str = "address_codes";


/// Object path of a staged entity, derived from its kind and identity.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct StagingPath(String);


impl StagingPath {
    pub fn block(number: BlockNumber) -> Self {
        Self(format!("{}/block_{:010}.json", BLOCKS_DIR, number))
    }

    pub fn receipt(tx_hash: &str) -> Self {
        Self(format!("{}/tx_receipt_{}.json", RECEIPTS_DIR, tx_hash))
    }

    pub fn address_code(address: &str) -> Self {
        Self(format!("{}/address_code_{}.json", ADDRESS_CODES_DIR, address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}


impl AsRef<str> for StagingPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}


impl Display for StagingPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
