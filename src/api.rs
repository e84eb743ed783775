//!
//! Crate APIs, essential structs, functions, methods are all here!
//!
//! To quickly understand how to use this crate, have a look at the
//! documentation for `coin_parser::CoinParser`.
//!
//! # Example
//!
//! ```rust
//! use coin_parser::{ChainParams, CoinParser, Network};
//!
//! let parser = CoinParser::new(ChainParams::chipo(Network::Mainnet)).unwrap();
//! let tx = parser.parse_tx(&raw_tx).unwrap();
//! let record = parser.pack_tx(&tx, 10, 1574488901).unwrap();
//! ```
//!

use crate::params::ChainParams;
use crate::parser::block::BlockCodec;
use crate::parser::errors::ParseResult;
use crate::parser::packed::PackedTxCodec;
use crate::parser::proto::block_proto::Block;
use crate::parser::proto::tx_proto::Transaction;
use crate::parser::script::{ScriptAddressCodec, ScriptInfo};
use crate::parser::transaction::TransactionCodec;
use bitcoin_hashes::hex::FromHex;
use log::{info, warn};
use rayon::prelude::*;

///
/// This is the main struct of this crate!! Click and read the doc.
///
/// Owns the chain parameters and hands out codecs borrowing them.
///
#[derive(Clone, Debug)]
pub struct CoinParser {
    params: ChainParams,
}

impl CoinParser {
    ///
    /// Build a parser for one chain. Inconsistent parameters are
    /// rejected with `InvalidParams`.
    ///
    pub fn new(params: ChainParams) -> ParseResult<CoinParser> {
        params.validate()?;
        info!("coin parser ready for {} {}", params.name, params.network);
        Ok(CoinParser { params })
    }

    ///
    /// Build a parser from a coin name and a network name,
    /// e.g. `("chipo", "main")`.
    ///
    pub fn from_names(coin: &str, network: &str) -> ParseResult<CoinParser> {
        CoinParser::new(ChainParams::from_names(coin, network)?)
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn script_codec(&self) -> ScriptAddressCodec<'_> {
        ScriptAddressCodec::new(&self.params)
    }

    pub fn tx_codec(&self) -> TransactionCodec<'_> {
        TransactionCodec::new(&self.params)
    }

    pub fn block_codec(&self) -> BlockCodec<'_> {
        BlockCodec::new(&self.params)
    }

    pub fn packed_codec(&self) -> PackedTxCodec<'_> {
        PackedTxCodec::new(&self.params)
    }

    ///
    /// Decode a single consensus-serialized transaction.
    ///
    pub fn parse_tx(&self, raw: &[u8]) -> ParseResult<Transaction> {
        self.tx_codec().decode(raw)
    }

    ///
    /// Decode a single consensus-serialized block.
    ///
    pub fn parse_block(&self, raw: &[u8]) -> ParseResult<Block> {
        self.block_codec().decode(raw)
    }

    ///
    /// Decode independent blocks in parallel.
    ///
    /// One result per block, in input order. A failing block does not
    /// affect the others.
    ///
    /// # Example
    ///
    /// ```rust
    /// for (i, result) in parser.parse_blocks(&raw_blocks).into_iter().enumerate() {
    ///     match result {
    ///         Ok(block) => println!("block {} has {} txs", i, block.txs.len()),
    ///         Err(e) => println!("block {} failed: {}", i, e),
    ///     }
    /// }
    /// ```
    ///
    pub fn parse_blocks(&self, raw_blocks: &[Vec<u8>]) -> Vec<ParseResult<Block>> {
        raw_blocks
            .par_iter()
            .enumerate()
            .map(|(i, raw)| {
                let result = self.parse_block(raw);
                if let Err(e) = &result {
                    warn!("failed to decode block {} of batch ({} bytes): {}", i, raw.len(), e);
                }
                result
            })
            .collect()
    }

    ///
    /// Serialize a transaction to its packed storage record.
    ///
    pub fn pack_tx(&self, tx: &Transaction, height: u32, blocktime: i64) -> ParseResult<Vec<u8>> {
        self.packed_codec().pack(tx, height, blocktime)
    }

    ///
    /// Restore a transaction and its height from a packed storage record.
    ///
    pub fn unpack_tx(&self, record: &[u8]) -> ParseResult<(Transaction, u32)> {
        self.packed_codec().unpack(record)
    }

    ///
    /// Addresses paid by an address descriptor (output script), and
    /// whether the script is a recognized standard pattern.
    ///
    pub fn get_addresses_from_addr_desc(&self, descriptor: &[u8]) -> (Vec<String>, bool) {
        self.script_codec()
            .addresses_from_address_descriptor(descriptor)
    }

    ///
    /// Address descriptor (output script) paying to `address`.
    ///
    pub fn get_addr_desc_from_address(&self, address: &str) -> ParseResult<Vec<u8>> {
        self.script_codec().address_descriptor_from_address(address)
    }

    ///
    /// Extract addresses and the script type from a hex script public key.
    ///
    pub fn parse_script(&self, script_pub_key: &str) -> ParseResult<ScriptInfo> {
        let script = Vec::<u8>::from_hex(script_pub_key)?;
        Ok(self.script_codec().script_info(&script))
    }
}
