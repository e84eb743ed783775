//!
//! Packed storage records.
//!
//! A record is what the index stores per transaction: the consensus bytes
//! plus the decoded fields an indexer reads most, so a transaction can be
//! served without re-parsing. Output addresses are written for readers of
//! the raw record but never trusted on the way back: `unpack` recomputes
//! them from the stored script.
//!

use crate::params::ChainParams;
use crate::parser::errors::{ParseError, ParseResult};
use crate::parser::proto::packed_proto::{ProtoTransaction, ProtoVin, ProtoVout};
use crate::parser::proto::tx_proto::{Hash256, Input, InputSource, Output, Transaction};
use crate::parser::transaction::TransactionCodec;
use bitcoin_hashes::hex::{FromHex, ToHex};
use log::trace;
use num_bigint::BigUint;
use num_traits::Zero;
use prost::Message;
use std::convert::TryFrom;

#[derive(Clone, Copy, Debug)]
pub struct PackedTxCodec<'a> {
    params: &'a ChainParams,
    txs: TransactionCodec<'a>,
}

impl<'a> PackedTxCodec<'a> {
    pub fn new(params: &'a ChainParams) -> Self {
        PackedTxCodec {
            params,
            txs: TransactionCodec::new(params),
        }
    }

    ///
    /// Serialize a transaction confirmed at `height` in a block with `blocktime`.
    ///
    pub fn pack(&self, tx: &Transaction, height: u32, blocktime: i64) -> ParseResult<Vec<u8>> {
        let vin = tx.vin.iter().map(pack_input).collect();
        let vout = tx
            .vout
            .iter()
            .map(|o| self.pack_output(o))
            .collect::<ParseResult<Vec<_>>>()?;
        let record = ProtoTransaction {
            txid: tx.txid.to_display_bytes().to_vec(),
            hex: tx.hex.clone(),
            blocktime: Some(blocktime as u64),
            locktime: Some(tx.lock_time as u64),
            height: Some(height as u64),
            vin,
            vout,
            version: Some(tx.version as i64),
        };
        trace!("packed tx {} at height {}", tx.txid, height);
        Ok(record.encode_to_vec())
    }

    ///
    /// Restore a transaction and its confirming height from a packed record.
    ///
    pub fn unpack(&self, record: &[u8]) -> ParseResult<(Transaction, u32)> {
        let pt = ProtoTransaction::decode(record)?;

        let txid = Hash256::from_display_slice(&pt.txid)
            .ok_or_else(|| corrupt(format!("txid of {} bytes", pt.txid.len())))?;
        let height = narrow::<u32>(pt.height.ok_or_else(|| corrupt("missing height"))?, "height")?;
        // stored as the two's complement bit pattern
        let blocktime = pt.blocktime.map(|t| t as i64);
        let vin = pt
            .vin
            .into_iter()
            .map(unpack_input)
            .collect::<ParseResult<Vec<_>>>()?;
        let vout = pt
            .vout
            .into_iter()
            .enumerate()
            .map(|(position, o)| self.unpack_output(position, o))
            .collect::<ParseResult<Vec<_>>>()?;

        let mut tx = Transaction {
            txid,
            hex: pt.hex,
            version: i32::try_from(pt.version.unwrap_or(0))
                .map_err(|_| corrupt("version out of range"))?,
            lock_time: narrow::<u32>(pt.locktime.unwrap_or(0), "locktime")?,
            vin,
            vout,
            blocktime,
        };
        self.check_consensus_bytes(&mut tx)?;
        Ok((tx, height))
    }

    ///
    /// The stored txid must match the id recomputed from the stored
    /// consensus bytes, or from the unpacked fields when the record has
    /// none. Witness stacks are not part of the record layout and are
    /// restored from the consensus bytes.
    ///
    fn check_consensus_bytes(&self, tx: &mut Transaction) -> ParseResult<()> {
        if tx.hex.is_empty() {
            let txid = self
                .txs
                .txid(tx)
                .map_err(|e| corrupt(format!("cannot recompute txid: {}", e)))?;
            return check_txid(&tx.txid, &txid);
        }
        let decoded = self
            .txs
            .decode(&tx.hex)
            .map_err(|e| corrupt(format!("stored transaction bytes: {}", e)))?;
        check_txid(&tx.txid, &decoded.txid)?;
        if decoded.vin.len() != tx.vin.len() || decoded.vout.len() != tx.vout.len() {
            return Err(corrupt(format!(
                "{} inputs and {} outputs stored, transaction bytes have {} and {}",
                tx.vin.len(),
                tx.vout.len(),
                decoded.vin.len(),
                decoded.vout.len()
            )));
        }
        for (input, stored) in tx.vin.iter_mut().zip(decoded.vin) {
            input.witness = stored.witness;
        }
        Ok(())
    }

    fn pack_output(&self, output: &Output) -> ParseResult<ProtoVout> {
        let value = if output.value.is_zero() {
            Vec::new()
        } else {
            output.value.to_bytes_be()
        };
        if value.len() > self.params.packed_amount_bytes {
            return Err(ParseError::AmountOverflow {
                width: self.params.packed_amount_bytes,
            });
        }
        Ok(ProtoVout {
            value,
            n: Some(output.n as u64),
            script_pubkey: output.script_pubkey.clone(),
            addresses: output.addresses.clone(),
        })
    }

    fn unpack_output(&self, position: usize, pv: ProtoVout) -> ParseResult<Output> {
        if pv.value.len() > self.params.packed_amount_bytes {
            return Err(corrupt(format!(
                "amount of {} bytes exceeds {}",
                pv.value.len(),
                self.params.packed_amount_bytes
            )));
        }
        let n = narrow::<u32>(pv.n.unwrap_or(0), "output index")?;
        if n as usize != position {
            return Err(corrupt(format!("output {} stored at position {}", n, position)));
        }
        Ok(self
            .txs
            .output(n, BigUint::from_bytes_be(&pv.value), pv.script_pubkey))
    }
}

fn pack_input(input: &Input) -> ProtoVin {
    let (coinbase, txid, vout) = match &input.source {
        InputSource::Coinbase(data) => (data.to_hex(), Vec::new(), 0),
        InputSource::Outpoint { txid, vout } => {
            (String::new(), txid.to_display_bytes().to_vec(), *vout)
        }
    };
    ProtoVin {
        coinbase: Some(coinbase),
        txid,
        vout: Some(vout as u64),
        script_sig: input.script_sig.clone(),
        sequence: Some(input.sequence as u64),
        addresses: input.addresses.clone(),
    }
}

///
/// A missing previous txid marks a coinbase input. Real outpoints always
/// store 32 bytes, so an all-zero previous txid stays a regular input.
///
fn unpack_input(pv: ProtoVin) -> ParseResult<Input> {
    let source = if pv.txid.is_empty() {
        let data = Vec::<u8>::from_hex(pv.coinbase.as_deref().unwrap_or(""))
            .map_err(|e| corrupt(format!("coinbase data: {}", e)))?;
        InputSource::Coinbase(data)
    } else {
        let txid = Hash256::from_display_slice(&pv.txid)
            .ok_or_else(|| corrupt(format!("previous txid of {} bytes", pv.txid.len())))?;
        InputSource::Outpoint {
            txid,
            vout: narrow::<u32>(pv.vout.unwrap_or(0), "previous index")?,
        }
    };
    Ok(Input {
        source,
        script_sig: pv.script_sig,
        sequence: narrow::<u32>(pv.sequence.unwrap_or(0), "sequence")?,
        witness: Vec::new(),
        addresses: pv.addresses,
    })
}

fn check_txid(stored: &Hash256, computed: &Hash256) -> ParseResult<()> {
    if stored != computed {
        return Err(corrupt(format!(
            "stored txid {} does not match transaction {}",
            stored, computed
        )));
    }
    Ok(())
}

fn narrow<T: TryFrom<u64>>(v: u64, field: &str) -> ParseResult<T> {
    T::try_from(v).map_err(|_| corrupt(format!("{} {} out of range", field, v)))
}

fn corrupt<S: Into<String>>(msg: S) -> ParseError {
    ParseError::CorruptRecord(msg.into())
}
