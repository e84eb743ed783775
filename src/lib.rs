//!
//! # Introduction
//!
//! This library decodes consensus-serialized blocks and transactions of
//! Bitcoin-derived chains (Chipo first, Bitcoin for reference), and
//! converts them to and from the packed records a blockchain indexer
//! stores per transaction.
//!
//! It classifies output scripts, derives addresses from them, and maps
//! addresses back to the scripts paying them.
//!
//! Everything chain-specific lives in a `ChainParams` value, so one
//! codebase serves every supported chain and network.
//!
//! ## Caveat
//!
//! No consensus validation is done: signatures, proof of work and the
//! merkle root are passed through unchecked.
//!
//! # Example
//!
//! ```rust
//! use coin_parser::{ChainParams, CoinParser, Network};
//!
//! let parser = CoinParser::new(ChainParams::chipo(Network::Mainnet)).unwrap();
//!
//! // decode a block and pack its transactions
//! let block = parser.parse_block(&raw_block).unwrap();
//! for tx in &block.txs {
//!     let record = parser.pack_tx(tx, height, block.time).unwrap();
//! }
//! ```
//!

pub(crate) mod api;
pub mod params;
pub mod parser;

#[doc(inline)]
pub use crate::api::*;
pub use crate::params::{ChainParams, HashAlgorithm, Network};
pub use crate::parser::block::BlockCodec;
pub use crate::parser::errors::{ParseError, ParseResult};
pub use crate::parser::packed::PackedTxCodec;
pub use crate::parser::proto::block_proto::{Block, BlockHeader};
pub use crate::parser::proto::tx_proto::{
    BlockHash, Hash256, Input, InputSource, Output, Transaction, Txid,
};
pub use crate::parser::script::{ScriptAddressCodec, ScriptInfo, ScriptType};
pub use crate::parser::transaction::TransactionCodec;
pub use bitcoin_hashes::hex::{FromHex, ToHex};
