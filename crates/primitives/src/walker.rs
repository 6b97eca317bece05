//! Expansion of fetched entities into the entities they reference.
//!
//! A block expands into the hashes of its transactions, a receipt into the
//! addresses that took part in the transaction. Both walks are pure and keep
//! source order, so a retried block repeats the exact same call sequence.
use crate::{Block, TransactionReceipt};


pub fn transaction_hashes(block: &Block) -> Vec<&str> {
    block.transactions.iter().map(|tx| tx.hash()).collect()
}


/// Returns `to` (when present) followed by `from`.
///
/// Empty strings count as absent. A self-send yields the same address twice.
pub fn addresses(receipt: &TransactionReceipt) -> Vec<&str> {
    let mut result = Vec::with_capacity(2);
    if let Some(to) = receipt.to.as_deref().filter(|to| !to.is_empty()) {
        result.push(to);
    }
    if !receipt.from.is_empty() {
        result.push(receipt.from.as_str());
    }
    result
}
