//!
//! Chain parameters.
//!
//! Everything chain-specific the codecs need lives in one immutable
//! `ChainParams` value, built once per chain and borrowed by every codec.
//!

use crate::parser::errors::{ParseError, ParseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widest consensus amount encoding the codecs accept.
pub const MAX_AMOUNT_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl FromStr for Network {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" => Ok(Network::Mainnet),
            "test" | "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(ParseError::InvalidParams(format!(
                "unknown network name: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Network::Mainnet => write!(f, "main"),
            Network::Testnet => write!(f, "test"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

///
/// Hash function used to derive transaction ids from consensus bytes.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    DoubleSha256,
    Sha256,
}

///
/// Static description of a Bitcoin-derived chain.
///
/// `amount_width` is the byte width of output values in consensus
/// encoding. `packed_amount_bytes` is the maximum width an amount may take
/// inside a packed storage record; it bounds what `unpack` accepts.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChainParams {
    pub name: String,
    pub network: Network,
    pub pubkey_hash_prefix: Vec<u8>,
    pub script_hash_prefix: Vec<u8>,
    #[serde(default)]
    pub bech32_hrp: Option<String>,
    #[serde(default)]
    pub segwit: bool,
    pub tx_hash: HashAlgorithm,
    pub amount_width: usize,
    pub packed_amount_bytes: usize,
}

impl ChainParams {
    ///
    /// Chipo: legacy (non-segwit) chain with 8 byte amounts.
    ///
    /// Packed records commit to 16 byte amounts, far above the supply cap.
    ///
    pub fn chipo(network: Network) -> ChainParams {
        // only the mainnet pubkey hash prefix is pinned by stored records
        let (pkh, sh) = match network {
            Network::Mainnet => (28, 88),
            Network::Testnet | Network::Regtest => (87, 188),
        };
        ChainParams {
            name: "chipo".to_string(),
            network,
            pubkey_hash_prefix: vec![pkh],
            script_hash_prefix: vec![sh],
            bech32_hrp: None,
            segwit: false,
            tx_hash: HashAlgorithm::DoubleSha256,
            amount_width: 8,
            packed_amount_bytes: 16,
        }
    }

    pub fn bitcoin(network: Network) -> ChainParams {
        let (pkh, sh, hrp) = match network {
            Network::Mainnet => (0x00, 0x05, "bc"),
            Network::Testnet => (0x6f, 0xc4, "tb"),
            Network::Regtest => (0x6f, 0xc4, "bcrt"),
        };
        ChainParams {
            name: "bitcoin".to_string(),
            network,
            pubkey_hash_prefix: vec![pkh],
            script_hash_prefix: vec![sh],
            bech32_hrp: Some(hrp.to_string()),
            segwit: true,
            tx_hash: HashAlgorithm::DoubleSha256,
            amount_width: 8,
            packed_amount_bytes: 16,
        }
    }

    ///
    /// Look up a preset by coin and network name, e.g. `("chipo", "main")`.
    ///
    pub fn from_names(coin: &str, network: &str) -> ParseResult<ChainParams> {
        let network = Network::from_str(network)?;
        match coin {
            "chipo" => Ok(ChainParams::chipo(network)),
            "bitcoin" | "btc" => Ok(ChainParams::bitcoin(network)),
            other => Err(ParseError::InvalidParams(format!(
                "unknown coin: {}",
                other
            ))),
        }
    }

    ///
    /// Reject parameter sets the codecs cannot work with.
    ///
    pub fn validate(&self) -> ParseResult<()> {
        if self.pubkey_hash_prefix.is_empty() || self.script_hash_prefix.is_empty() {
            return Err(ParseError::InvalidParams(
                "address prefixes must not be empty".to_string(),
            ));
        }
        if self.pubkey_hash_prefix == self.script_hash_prefix {
            return Err(ParseError::InvalidParams(
                "pubkey hash and script hash prefixes collide".to_string(),
            ));
        }
        if self.amount_width == 0 || self.amount_width > MAX_AMOUNT_WIDTH {
            return Err(ParseError::InvalidParams(format!(
                "amount width {} outside 1..={}",
                self.amount_width, MAX_AMOUNT_WIDTH
            )));
        }
        if self.packed_amount_bytes < self.amount_width {
            return Err(ParseError::InvalidParams(format!(
                "packed amount width {} narrower than consensus width {}",
                self.packed_amount_bytes, self.amount_width
            )));
        }
        if self.segwit && self.bech32_hrp.is_none() {
            return Err(ParseError::InvalidParams(
                "segwit chains need a bech32 hrp".to_string(),
            ));
        }
        Ok(())
    }
}
