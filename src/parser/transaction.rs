use crate::params::{ChainParams, HashAlgorithm};
use crate::parser::errors::{ParseError, ParseResult};
use crate::parser::proto::tx_proto::{Hash256, Input, InputSource, Output, Transaction, Txid};
use crate::parser::reader::{BlockchainRead, BlockchainWrite};
use crate::parser::script::ScriptAddressCodec;
use bitcoin_hashes::{sha256, sha256d, Hash};
use log::trace;
use num_bigint::BigUint;
use std::io::Cursor;

/// previous txid + index + empty script length + sequence
pub const MIN_INPUT_SIZE: usize = 32 + 4 + 1 + 4;

/// index used by the null outpoint of coinbase inputs
pub const COINBASE_VOUT: u32 = u32::MAX;

const WITNESS_MARKER: u8 = 0x00;
const WITNESS_FLAG: u8 = 0x01;

///
/// Consensus transaction codec.
///
/// Re-encoding a decoded transaction reproduces its bytes exactly:
/// non-minimal CompactSize prefixes are rejected on decode, so there is
/// nothing to canonicalize.
///
#[derive(Clone, Copy, Debug)]
pub struct TransactionCodec<'a> {
    params: &'a ChainParams,
    scripts: ScriptAddressCodec<'a>,
}

impl<'a> TransactionCodec<'a> {
    pub fn new(params: &'a ChainParams) -> Self {
        TransactionCodec {
            params,
            scripts: ScriptAddressCodec::new(params),
        }
    }

    ///
    /// Decode a transaction that must span all of `raw`.
    ///
    pub fn decode(&self, raw: &[u8]) -> ParseResult<Transaction> {
        let mut cursor = Cursor::new(raw);
        let tx = self.decode_from(&mut cursor)?;
        match cursor.remaining() {
            0 => Ok(tx),
            left => Err(ParseError::TrailingBytes(left)),
        }
    }

    ///
    /// Decode one transaction starting at the cursor position and leave
    /// the cursor right after it.
    ///
    pub fn decode_from(&self, cursor: &mut Cursor<&[u8]>) -> ParseResult<Transaction> {
        let start = cursor.position() as usize;
        let version = cursor.read_i32("version")?;
        let segwit = self.params.segwit && self.skip_witness_marker(cursor);

        let input_count = cursor.read_count("input count", MIN_INPUT_SIZE)?;
        let mut vin = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let txid = cursor.read_hash("previous txid")?;
            let vout = cursor.read_u32("previous index")?;
            let script = cursor.read_var_bytes("signature script")?;
            let sequence = cursor.read_u32("sequence")?;
            let input = if input_count == 1 && txid.is_zero() && vout == COINBASE_VOUT {
                Input::coinbase(script, sequence)
            } else {
                Input::spending(txid, vout, script, sequence)
            };
            vin.push(input);
        }

        let width = self.params.amount_width;
        let output_count = cursor.read_count("output count", width + 1)?;
        let mut vout = Vec::with_capacity(output_count);
        for n in 0..output_count {
            let value = cursor.read_amount(width, "value")?;
            let script = cursor.read_var_bytes("output script")?;
            vout.push(self.output(n as u32, value, script));
        }

        if segwit {
            for input in vin.iter_mut() {
                let items = cursor.read_count("witness item count", 1)?;
                let mut stack = Vec::with_capacity(items);
                for _ in 0..items {
                    stack.push(cursor.read_var_bytes("witness item")?);
                }
                input.witness = stack;
            }
            if vin.iter().all(|i| i.witness.is_empty()) {
                return Err(ParseError::MalformedCount {
                    field: "witness",
                    count: 0,
                });
            }
        }

        let lock_time = cursor.read_u32("lock time")?;
        let end = cursor.position() as usize;

        let mut tx = Transaction {
            txid: Hash256::default(),
            hex: cursor.get_ref()[start..end].to_vec(),
            version,
            lock_time,
            vin,
            vout,
            blocktime: None,
        };
        tx.txid = self.txid(&tx)?;
        trace!(
            "decoded tx {} ({} inputs, {} outputs)",
            tx.txid,
            tx.vin.len(),
            tx.vout.len()
        );
        Ok(tx)
    }

    ///
    /// Consensus encoding, with witness data when any input carries some.
    ///
    pub fn encode(&self, tx: &Transaction) -> ParseResult<Vec<u8>> {
        self.encode_inner(tx, tx.has_witness())
    }

    /// Consensus encoding without witness data, the preimage of the txid.
    pub fn encode_stripped(&self, tx: &Transaction) -> ParseResult<Vec<u8>> {
        self.encode_inner(tx, false)
    }

    ///
    /// Transaction id: the chain's hash of the stripped encoding.
    ///
    pub fn txid(&self, tx: &Transaction) -> ParseResult<Txid> {
        let bytes = self.encode_stripped(tx)?;
        Ok(self.hash(&bytes))
    }

    pub(crate) fn hash(&self, bytes: &[u8]) -> Hash256 {
        match self.params.tx_hash {
            HashAlgorithm::DoubleSha256 => Hash256(sha256d::Hash::hash(bytes).into_inner()),
            HashAlgorithm::Sha256 => Hash256(sha256::Hash::hash(bytes).into_inner()),
        }
    }

    /// Build an output, deriving its script type and addresses.
    pub(crate) fn output(&self, n: u32, value: BigUint, script_pubkey: Vec<u8>) -> Output {
        let info = self.scripts.script_info(&script_pubkey);
        Output {
            value,
            n,
            script_pubkey,
            script_type: info.pattern,
            addresses: info.addresses,
        }
    }

    fn skip_witness_marker(&self, cursor: &mut Cursor<&[u8]>) -> bool {
        let pos = cursor.position() as usize;
        let data = *cursor.get_ref();
        if data.len() >= pos + 2 && data[pos] == WITNESS_MARKER && data[pos + 1] == WITNESS_FLAG {
            cursor.set_position((pos + 2) as u64);
            true
        } else {
            false
        }
    }

    fn encode_inner(&self, tx: &Transaction, with_witness: bool) -> ParseResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(tx.hex.len().max(64));
        buf.write_i32(tx.version);
        if with_witness {
            buf.push(WITNESS_MARKER);
            buf.push(WITNESS_FLAG);
        }

        buf.write_varint(tx.vin.len() as u64);
        for input in &tx.vin {
            match &input.source {
                InputSource::Coinbase(data) => {
                    buf.extend_from_slice(&[0u8; 32]);
                    buf.write_u32(COINBASE_VOUT);
                    buf.write_var_bytes(data);
                }
                InputSource::Outpoint { txid, vout } => {
                    buf.extend_from_slice(txid.as_bytes());
                    buf.write_u32(*vout);
                    buf.write_var_bytes(&input.script_sig);
                }
            }
            buf.write_u32(input.sequence);
        }

        buf.write_varint(tx.vout.len() as u64);
        for output in &tx.vout {
            buf.write_amount(&output.value, self.params.amount_width)?;
            buf.write_var_bytes(&output.script_pubkey);
        }

        if with_witness {
            for input in &tx.vin {
                buf.write_varint(input.witness.len() as u64);
                for item in &input.witness {
                    buf.write_var_bytes(item);
                }
            }
        }

        buf.write_u32(tx.lock_time);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Network;
    use crate::parser::script::ScriptType;
    use bitcoin_hashes::hex::{FromHex, ToHex};

    const TX1: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff035a0103ffffffff0100e1f50500000000232102f6e1b93078a37d5f6b517cb19ada666302593cfeec40c6e24b78b8b8fc3ed625ac00000000";

    // BIP143 native P2WPKH example, signed
    const SEGWIT_TX: &str = "01000000000102fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f00000000494830450221008b9d1dc26ba6a9cb62127b02742fa9d754cd3bebf337f7a55d114c8e5cdd30be022040529b194ba3f9281a99f2b1c0a19c0489bc22ede944ccf4ecbab4cc618ef3ed01eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac000247304402203609e17b84f6a7d30c80bfa610b5b4542f32a8a0d5447a12fb1366d7f01cc44a0220573a954c4518331561406f90300e8f3358f51928d43c212a8caed02de67eebee0121025476c2e83188368da1ff3e292e7acafcdb3566bb0ad253f62fc70f07aeee635711000000";

    fn chipo() -> ChainParams {
        ChainParams::chipo(Network::Mainnet)
    }

    fn raw(hex: &str) -> Vec<u8> {
        Vec::<u8>::from_hex(hex).unwrap()
    }

    #[test]
    fn test_decode_coinbase_tx() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let tx = codec.decode(&raw(TX1)).unwrap();

        assert_eq!(
            tx.txid.to_string(),
            "8e29a4aaf8bfdcf2e485ac2d6494d85c3960d37f178d5826233ee601b647d14b"
        );
        assert_eq!(tx.version, 1);
        assert_eq!(tx.lock_time, 0);
        assert!(tx.is_coinbase());
        assert_eq!(tx.vin[0].coinbase_data(), Some(&[0x5a, 0x01, 0x03][..]));
        assert_eq!(tx.vin[0].sequence, u32::MAX);
        assert_eq!(tx.vout.len(), 1);
        assert_eq!(tx.vout[0].value, BigUint::from(100_000_000u64));
        assert_eq!(tx.vout[0].script_type, ScriptType::Pay2PublicKey);
        assert_eq!(tx.vout[0].addresses, vec!["CTjHVJGTHPFNE6haEi1hFPuCkBqUTCqLCF"]);
        assert_eq!(tx.hex.to_hex(), TX1);
    }

    #[test]
    fn test_encode_reproduces_input() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let bytes = raw(TX1);
        let tx = codec.decode(&bytes).unwrap();
        assert_eq!(codec.encode(&tx).unwrap(), bytes);
    }

    #[test]
    fn test_segwit_round_trip() {
        let params = ChainParams::bitcoin(Network::Mainnet);
        let codec = TransactionCodec::new(&params);
        let bytes = raw(SEGWIT_TX);
        let tx = codec.decode(&bytes).unwrap();

        assert_eq!(tx.vin.len(), 2);
        assert!(tx.vin[0].witness.is_empty());
        assert_eq!(tx.vin[1].witness.len(), 2);
        assert_eq!(codec.encode(&tx).unwrap(), bytes);
        // txid commits to the stripped form only
        assert_eq!(tx.txid, codec.hash(&codec.encode_stripped(&tx).unwrap()));
        assert_ne!(tx.txid, codec.hash(&bytes));
    }

    #[test]
    fn test_segwit_marker_ignored_when_disabled() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        // marker byte is read as an input count of zero
        assert!(codec.decode(&raw(SEGWIT_TX)).is_err());
    }

    #[test]
    fn test_truncated_script() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let bytes = raw(TX1);
        // cut in the middle of the output script
        let err = codec.decode(&bytes[..70]).unwrap_err();
        assert_eq!(
            err,
            ParseError::TruncatedInput {
                field: "output script"
            }
        );
    }

    #[test]
    fn test_implausible_input_count() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let bytes = raw("01000000fdffff00000000");
        assert!(matches!(
            codec.decode(&bytes),
            Err(ParseError::MalformedCount {
                field: "input count",
                count: 0xffff
            })
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let mut bytes = raw(TX1);
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(codec.decode(&bytes), Err(ParseError::TrailingBytes(2)));
    }

    #[test]
    fn test_encode_rejects_wide_amount() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let mut tx = codec.decode(&raw(TX1)).unwrap();
        tx.vout[0].value = BigUint::from(u64::MAX) * 2u8;
        assert_eq!(
            codec.encode(&tx),
            Err(ParseError::AmountOverflow { width: 8 })
        );
    }

    #[test]
    fn test_zero_outpoint_is_not_coinbase_with_many_inputs() {
        let params = chipo();
        let codec = TransactionCodec::new(&params);
        let null_input = Input::spending(Hash256::default(), COINBASE_VOUT, vec![], 0);
        let tx = Transaction {
            txid: Hash256::default(),
            hex: vec![],
            version: 2,
            lock_time: 0,
            vin: vec![null_input.clone(), null_input],
            vout: vec![],
            blocktime: None,
        };
        let bytes = codec.encode(&tx).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert!(decoded.vin.iter().all(|i| !i.is_coinbase()));
        assert_eq!(decoded.vin, tx.vin);
    }
}
