use crate::parser::script::ScriptType;
use bitcoin_hashes::hex::{self, FromHex, ToHex};
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

///
/// A 32 byte hash stored in wire order.
///
/// Displayed and parsed byte-reversed, the way block explorers print
/// transaction ids and block hashes.
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

pub type Txid = Hash256;
pub type BlockHash = Hash256;

impl Hash256 {
    pub fn from_slice(wire: &[u8]) -> Option<Hash256> {
        if wire.len() != 32 {
            return None;
        }
        let mut inner = [0u8; 32];
        inner.copy_from_slice(wire);
        Some(Hash256(inner))
    }

    /// build from display-order bytes (reversed wire order)
    pub fn from_display_slice(display: &[u8]) -> Option<Hash256> {
        let mut h = Hash256::from_slice(display)?;
        h.0.reverse();
        Some(h)
    }

    pub fn to_display_bytes(&self) -> [u8; 32] {
        let mut out = self.0;
        out.reverse();
        out
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_display_bytes().to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Hash256 {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = Vec::<u8>::from_hex(s)?;
        Hash256::from_display_slice(&bytes).ok_or(hex::Error::InvalidLength(32, bytes.len()))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_str(&s).map_err(de::Error::custom)
    }
}

///
/// Where an input's value comes from.
///
/// A coinbase input carries free-form data in place of a previous output
/// reference; the two never coexist.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Coinbase(Vec<u8>),
    Outpoint { txid: Txid, vout: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub source: InputSource,
    /// empty for coinbase inputs, whose script is `InputSource::Coinbase`
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
    /// addresses of the spent output, when known to the indexer
    pub addresses: Vec<String>,
}

impl Input {
    pub fn coinbase(data: Vec<u8>, sequence: u32) -> Input {
        Input {
            source: InputSource::Coinbase(data),
            script_sig: Vec::new(),
            sequence,
            witness: Vec::new(),
            addresses: Vec::new(),
        }
    }

    pub fn spending(txid: Txid, vout: u32, script_sig: Vec<u8>, sequence: u32) -> Input {
        Input {
            source: InputSource::Outpoint { txid, vout },
            script_sig,
            sequence,
            witness: Vec::new(),
            addresses: Vec::new(),
        }
    }

    #[inline]
    pub fn is_coinbase(&self) -> bool {
        matches!(self.source, InputSource::Coinbase(_))
    }

    pub fn outpoint(&self) -> Option<(&Txid, u32)> {
        match &self.source {
            InputSource::Outpoint { txid, vout } => Some((txid, *vout)),
            InputSource::Coinbase(_) => None,
        }
    }

    pub fn coinbase_data(&self) -> Option<&[u8]> {
        match &self.source {
            InputSource::Coinbase(data) => Some(data),
            InputSource::Outpoint { .. } => None,
        }
    }
}

///
/// Transaction output with its derived script classification.
///
/// `script_type` and `addresses` are never authoritative: they are
/// recomputed from `script_pubkey` whenever an output is decoded or unpacked.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: BigUint,
    pub n: u32,
    pub script_pubkey: Vec<u8>,
    pub script_type: ScriptType,
    pub addresses: Vec<String>,
}

///
/// A decoded transaction.
///
/// `txid` is derived by hashing the stripped consensus encoding; it is never
/// read from input. `hex` keeps the consensus bytes the transaction was
/// decoded from, or is empty for transactions assembled by hand.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: Txid,
    pub hex: Vec<u8>,
    pub version: i32,
    pub lock_time: u32,
    pub vin: Vec<Input>,
    pub vout: Vec<Output>,
    /// time of the confirming block, seconds since epoch
    pub blocktime: Option<i64>,
}

impl Transaction {
    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].is_coinbase()
    }

    pub fn has_witness(&self) -> bool {
        self.vin.iter().any(|i| !i.witness.is_empty())
    }
}
