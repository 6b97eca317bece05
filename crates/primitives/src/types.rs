use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};


pub type BlockNumber = u64;

pub type TransactionHash = String;

pub type Address = String;


/// Parses a `0x`-prefixed hex quantity as served by JSON-RPC nodes.
pub fn parse_quantity(value: &str) -> Option<u64> {
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None
    }
    u64::from_str_radix(digits, 16).ok()
}


pub fn to_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}


/// Block payload as returned by `eth_getBlockByNumber`.
///
/// Only the fields the pipeline looks at are typed. Everything else
/// is carried in `rest` so the staged object keeps the node's payload intact.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: String,
    pub hash: String,
    pub parent_hash: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub transactions: Vec<BlockTransaction>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}


impl Block {
    pub fn block_number(&self) -> Option<BlockNumber> {
        parse_quantity(&self.number)
    }

    pub fn ptr(&self) -> BlockPtr<'_> {
        BlockPtr {
            number: &self.number,
            hash: &self.hash
        }
    }
}


/// A block lists its transactions either as bare hashes or as full objects,
/// depending on the `hydrated` flag of the request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BlockTransaction {
    Hash(TransactionHash),
    Full(Transaction),
}


impl BlockTransaction {
    pub fn hash(&self) -> &str {
        match self {
            BlockTransaction::Hash(hash) => hash,
            BlockTransaction::Full(tx) => &tx.hash
        }
    }
}


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: TransactionHash,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TransactionHash,
    #[serde(default)]
    pub block_number: Option<String>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressCode {
    pub address: Address,
    pub address_code: String,
}


impl AddressCode {
    pub fn is_contract(&self) -> bool {
        !matches!(self.address_code.as_str(), "" | "0x")
    }
}


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockPtr<'a> {
    pub number: &'a str,
    pub hash: &'a str
}


impl<'a> Display for BlockPtr<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match parse_quantity(self.number) {
            Some(number) => write!(f, "{}#{}", number, self.hash),
            None => write!(f, "{}#{}", self.number, self.hash)
        }
    }
}
