use crate::params::ChainParams;
use crate::parser::errors::{ParseError, ParseResult};
use crate::parser::proto::block_proto::{Block, BlockHeader};
use crate::parser::reader::BlockchainRead;
use crate::parser::transaction::TransactionCodec;
use log::debug;
use std::io::Cursor;

pub const HEADER_SIZE: usize = 80;

/// version + empty input list + empty output list + lock time
pub const MIN_TX_SIZE: usize = 4 + 1 + 1 + 4;

///
/// Consensus block decoder.
///
#[derive(Clone, Copy, Debug)]
pub struct BlockCodec<'a> {
    txs: TransactionCodec<'a>,
}

impl<'a> BlockCodec<'a> {
    pub fn new(params: &'a ChainParams) -> Self {
        BlockCodec {
            txs: TransactionCodec::new(params),
        }
    }

    ///
    /// Decode the 80 byte header at the start of `raw`.
    ///
    pub fn decode_header(&self, raw: &[u8]) -> ParseResult<BlockHeader> {
        if raw.len() < HEADER_SIZE {
            return Err(ParseError::TruncatedBlock(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                raw.len()
            )));
        }
        let mut cursor = Cursor::new(&raw[..HEADER_SIZE]);
        read_header(&mut cursor).map_err(ParseError::into_block_error)
    }

    ///
    /// Decode a full block.
    ///
    /// The block must be consumed exactly; padding is reported as
    /// `TrailingBytes`. Every transaction keeps the exact byte slice it
    /// was decoded from and gets the block time.
    ///
    pub fn decode(&self, raw: &[u8]) -> ParseResult<Block> {
        let header = self.decode_header(raw)?;
        let mut cursor = Cursor::new(raw);
        cursor.set_position(HEADER_SIZE as u64);

        let tx_count = cursor
            .read_count("transaction count", MIN_TX_SIZE)
            .map_err(|e| match e {
                // a zero count is the non-minimal encoding case and passes through
                ParseError::MalformedCount { count, .. } if count > 0 => {
                    ParseError::TruncatedBlock(format!(
                        "{} transactions cannot fit in {} bytes",
                        count,
                        raw.len() - HEADER_SIZE
                    ))
                }
                other => other.into_block_error(),
            })?;

        let time = header.time as i64;
        let mut txs = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            let mut tx = self
                .txs
                .decode_from(&mut cursor)
                .map_err(ParseError::into_block_error)?;
            tx.blocktime = Some(time);
            txs.push(tx);
        }

        let left = cursor.remaining();
        if left > 0 {
            return Err(ParseError::TrailingBytes(left));
        }
        debug!(
            "decoded block {} bytes, time {}, {} transactions",
            raw.len(),
            time,
            txs.len()
        );
        Ok(Block {
            header,
            size: raw.len(),
            time,
            txs,
        })
    }
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> ParseResult<BlockHeader> {
    Ok(BlockHeader {
        version: cursor.read_i32("block version")?,
        prev_hash: cursor.read_hash("previous block hash")?,
        merkle_root: cursor.read_hash("merkle root")?,
        time: cursor.read_u32("block time")?,
        bits: cursor.read_u32("bits")?,
        nonce: cursor.read_u32("nonce")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Network;
    use bitcoin_hashes::hex::FromHex;

    const TX1: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff035a0103ffffffff0100e1f50500000000232102f6e1b93078a37d5f6b517cb19ada666302593cfeec40c6e24b78b8b8fc3ed625ac00000000";

    fn header(time: u32) -> Vec<u8> {
        let mut h = Vec::with_capacity(HEADER_SIZE);
        h.extend_from_slice(&1i32.to_le_bytes());
        h.extend_from_slice(&[0x11; 32]);
        h.extend_from_slice(&[0x22; 32]);
        h.extend_from_slice(&time.to_le_bytes());
        h.extend_from_slice(&0x1e0ffff0u32.to_le_bytes());
        h.extend_from_slice(&42u32.to_le_bytes());
        h
    }

    fn block_with_tx1() -> Vec<u8> {
        let mut raw = header(1574488901);
        raw.push(1);
        raw.extend(Vec::<u8>::from_hex(TX1).unwrap());
        raw
    }

    #[test]
    fn test_decode_single_tx_block() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        let raw = block_with_tx1();
        let block = codec.decode(&raw).unwrap();

        assert_eq!(block.size, 179);
        assert_eq!(block.time, 1574488901);
        assert_eq!(block.header.nonce, 42);
        assert_eq!(block.header.bits, 0x1e0ffff0);
        assert_eq!(block.txs.len(), 1);
        assert!(block.txs[0].is_coinbase());
        assert_eq!(block.txs[0].blocktime, Some(1574488901));
    }

    #[test]
    fn test_short_header() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        assert!(matches!(
            codec.decode(&header(0)[..79]),
            Err(ParseError::TruncatedBlock(_))
        ));
    }

    #[test]
    fn test_tx_count_exceeds_block() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        let mut raw = header(0);
        raw.push(50);
        raw.extend_from_slice(&[0u8; 40]);
        assert!(matches!(
            codec.decode(&raw),
            Err(ParseError::TruncatedBlock(_))
        ));
    }

    #[test]
    fn test_tx_runs_past_block_end() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        let mut raw = block_with_tx1();
        raw.truncate(raw.len() - 2);
        assert!(matches!(
            codec.decode(&raw),
            Err(ParseError::TruncatedBlock(_))
        ));
    }

    #[test]
    fn test_input_count_runs_past_block_end() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        let mut raw = block_with_tx1();
        raw.truncate(HEADER_SIZE + 1 + 30);
        assert!(matches!(
            codec.decode(&raw),
            Err(ParseError::TruncatedBlock(_))
        ));
    }

    #[test]
    fn test_non_minimal_tx_count() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        let mut raw = header(0);
        raw.extend_from_slice(&[0xfd, 0x01, 0x00]);
        raw.extend(Vec::<u8>::from_hex(TX1).unwrap());
        assert_eq!(
            codec.decode(&raw),
            Err(ParseError::MalformedCount {
                field: "transaction count",
                count: 0
            })
        );
    }

    #[test]
    fn test_padding_is_rejected() {
        let params = ChainParams::chipo(Network::Mainnet);
        let codec = BlockCodec::new(&params);
        let mut raw = block_with_tx1();
        raw.push(0);
        assert_eq!(codec.decode(&raw), Err(ParseError::TrailingBytes(1)));
    }
}
