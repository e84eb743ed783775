use crate::parser::proto::tx_proto::{BlockHash, Hash256, Transaction};
use serde::{Deserialize, Serialize};

///
/// Fixed 80 byte block header.
///
/// Only `time` is interpreted; the other fields are passed through as read.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_hash: BlockHash,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

///
/// A decoded block.
///
/// `size` is the length of the raw bytes the block was decoded from,
/// header included. Transactions keep wire order, so `txs[0]` is the
/// coinbase transaction of a well-formed block.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub size: usize,
    pub time: i64,
    pub txs: Vec<Transaction>,
}
