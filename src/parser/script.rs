use crate::params::ChainParams;
use crate::parser::errors::{ParseError, ParseResult};
use bitcoin::bech32::{self, u5, FromBase32, ToBase32, Variant};
use bitcoin::blockdata::opcodes::all;
use bitcoin::blockdata::script::{Instruction, Script};
use bitcoin::util::base58;
use bitcoin::PublicKey;
use bitcoin_hashes::{hash160, Hash};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use Instruction::{Op, PushBytes};

const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_DUP: u8 = 0x76;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;

///
/// Output script patterns.
///
/// `classify` tries them in declaration order, most specific first.
/// Chain-specific patterns are added here as new variants.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScriptType {
    Pay2PublicKeyHash,
    Pay2ScriptHash,
    Pay2WitnessPublicKeyHash,
    Pay2WitnessScriptHash,
    WitnessProgram,
    Pay2PublicKey,
    Pay2MultiSig,
    NullData,
    NonStandard,
}

impl ScriptType {
    /// whether scripts of this type can resolve to addresses
    pub fn is_known(&self) -> bool {
        !matches!(self, ScriptType::NullData | ScriptType::NonStandard)
    }
}

///
/// `ScriptInfo` stores a list of addresses extracted from an output script.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub addresses: Vec<String>,
    pub pattern: ScriptType,
}

impl ScriptInfo {
    pub(crate) fn new(address: Option<String>, pattern: ScriptType) -> Self {
        Self::from_vec(address.into_iter().collect(), pattern)
    }

    pub(crate) fn from_vec(addresses: Vec<String>, pattern: ScriptType) -> Self {
        Self { addresses, pattern }
    }

    /// known type that actually yielded addresses
    pub fn is_known(&self) -> bool {
        self.pattern.is_known() && !self.addresses.is_empty()
    }
}

///
/// Classify an output script. Never fails: anything unmatched is `NonStandard`.
///
pub fn classify(script: &[u8]) -> ScriptType {
    classify_script(&Script::from(script.to_vec()))
}

fn classify_script(script: &Script) -> ScriptType {
    if script.is_p2pkh() {
        ScriptType::Pay2PublicKeyHash
    } else if script.is_p2sh() {
        ScriptType::Pay2ScriptHash
    } else if script.is_v0_p2wpkh() {
        ScriptType::Pay2WitnessPublicKeyHash
    } else if script.is_v0_p2wsh() {
        ScriptType::Pay2WitnessScriptHash
    } else if script.is_witness_program() && script.as_bytes()[0] != OP_0 {
        // v0 programs of other lengths are not spendable outputs
        ScriptType::WitnessProgram
    } else if script.is_p2pk() && p2pk_key(script).is_some() {
        ScriptType::Pay2PublicKey
    } else if is_multisig(script) {
        ScriptType::Pay2MultiSig
    } else if script.is_op_return() {
        ScriptType::NullData
    } else {
        ScriptType::NonStandard
    }
}

///
/// Address derivation and the reverse mapping, parameterized by chain.
///
#[derive(Clone, Copy, Debug)]
pub struct ScriptAddressCodec<'a> {
    params: &'a ChainParams,
}

impl<'a> ScriptAddressCodec<'a> {
    pub fn new(params: &'a ChainParams) -> Self {
        ScriptAddressCodec { params }
    }

    ///
    /// Extract addresses and script type from an output script.
    ///
    pub fn script_info(&self, raw: &[u8]) -> ScriptInfo {
        let script = Script::from(raw.to_vec());
        let pattern = classify_script(&script);
        match pattern {
            ScriptType::Pay2PublicKeyHash => {
                ScriptInfo::new(Some(self.p2pkh_address(&raw[3..23])), pattern)
            }
            ScriptType::Pay2ScriptHash => {
                ScriptInfo::new(Some(self.p2sh_address(&raw[2..22])), pattern)
            }
            ScriptType::Pay2WitnessPublicKeyHash
            | ScriptType::Pay2WitnessScriptHash
            | ScriptType::WitnessProgram => {
                let address = witness_program(raw)
                    .and_then(|(version, program)| self.witness_address(version, program));
                ScriptInfo::new(address, pattern)
            }
            ScriptType::Pay2PublicKey => {
                let address = p2pk_key(&script).map(|pk| self.pubkey_address(pk));
                ScriptInfo::new(address, pattern)
            }
            ScriptType::Pay2MultiSig => {
                ScriptInfo::from_vec(self.multisig_addresses(&script), pattern)
            }
            ScriptType::NullData | ScriptType::NonStandard => {
                trace!("no addresses for {} script of {} bytes", pattern, raw.len());
                ScriptInfo::from_vec(Vec::new(), pattern)
            }
        }
    }

    ///
    /// Addresses of an output script, and whether the script is of a known type.
    ///
    /// Unknown scripts yield `(vec![], false)`; that is a classification,
    /// not an error.
    ///
    pub fn addresses_from_script(&self, script: &[u8]) -> (Vec<String>, bool) {
        let info = self.script_info(script);
        let known = info.is_known();
        (info.addresses, known)
    }

    /// An address descriptor is the output script an address denotes.
    #[inline]
    pub fn addresses_from_address_descriptor(&self, descriptor: &[u8]) -> (Vec<String>, bool) {
        self.addresses_from_script(descriptor)
    }

    ///
    /// Canonical output script of an address.
    ///
    /// Bech32 addresses may be all lowercase or all uppercase. The script
    /// maps back to the lowercase form, so an uppercase address does not
    /// survive a round trip byte for byte.
    ///
    pub fn address_descriptor_from_address(&self, address: &str) -> ParseResult<Vec<u8>> {
        if let Some(hrp) = &self.params.bech32_hrp {
            let prefix = format!("{}1", hrp);
            if address.to_lowercase().starts_with(&prefix) {
                return self.bech32_descriptor(hrp, address);
            }
        }
        self.base58_descriptor(address)
    }

    fn base58_descriptor(&self, address: &str) -> ParseResult<Vec<u8>> {
        let payload = base58::from_check(address)
            .map_err(|e| ParseError::InvalidAddress(format!("{}: {}", address, e)))?;
        let pkh = &self.params.pubkey_hash_prefix;
        let sh = &self.params.script_hash_prefix;
        if payload.starts_with(pkh) {
            let hash = hash_payload(&payload[pkh.len()..], address)?;
            Ok(p2pkh_script(hash))
        } else if payload.starts_with(sh) {
            let hash = hash_payload(&payload[sh.len()..], address)?;
            Ok(p2sh_script(hash))
        } else {
            Err(ParseError::InvalidAddress(format!(
                "{}: version byte not valid for {}",
                address, self.params.name
            )))
        }
    }

    fn bech32_descriptor(&self, hrp: &str, address: &str) -> ParseResult<Vec<u8>> {
        let invalid = |why: &str| ParseError::InvalidAddress(format!("{}: {}", address, why));
        let (decoded_hrp, data, variant) =
            bech32::decode(address).map_err(|e| invalid(&e.to_string()))?;
        if !decoded_hrp.eq_ignore_ascii_case(hrp) {
            return Err(invalid("wrong human-readable part"));
        }
        let (version, program) = match data.split_first() {
            Some((v, rest)) => (v.to_u8(), rest),
            None => return Err(invalid("empty witness data")),
        };
        let program = Vec::<u8>::from_base32(program).map_err(|e| invalid(&e.to_string()))?;
        if version > 16 {
            return Err(invalid("witness version above 16"));
        }
        if program.len() < 2 || program.len() > 40 {
            return Err(invalid("witness program length"));
        }
        match (version, variant) {
            (0, Variant::Bech32) if program.len() == 20 || program.len() == 32 => {}
            (0, Variant::Bech32) => return Err(invalid("witness v0 program length")),
            (0, Variant::Bech32m) => return Err(invalid("witness v0 must use bech32")),
            (_, Variant::Bech32) => return Err(invalid("witness v1+ must use bech32m")),
            (_, Variant::Bech32m) => {}
        }
        Ok(witness_script(version, &program))
    }

    fn p2pkh_address(&self, hash: &[u8]) -> String {
        base58_address(&self.params.pubkey_hash_prefix, hash)
    }

    fn p2sh_address(&self, hash: &[u8]) -> String {
        base58_address(&self.params.script_hash_prefix, hash)
    }

    /// Public keys are shown as the P2PKH address of their hash160.
    fn pubkey_address(&self, pubkey: &[u8]) -> String {
        let pkh = hash160::Hash::hash(pubkey);
        self.p2pkh_address(&pkh.into_inner())
    }

    fn witness_address(&self, version: u8, program: &[u8]) -> Option<String> {
        let hrp = self.params.bech32_hrp.as_ref()?;
        let variant = if version == 0 {
            Variant::Bech32
        } else {
            Variant::Bech32m
        };
        let mut data = vec![u5::try_from_u8(version).ok()?];
        data.extend(program.to_base32());
        bech32::encode(hrp, data, variant).ok()
    }

    ///
    /// One P2PKH address per key, in script order.
    ///
    /// Any malformed key makes the whole script address-less.
    ///
    fn multisig_addresses(&self, script: &Script) -> Vec<String> {
        let mut addresses = Vec::new();
        for ins in script.instructions().skip(1) {
            match ins {
                Ok(PushBytes(data)) => {
                    if PublicKey::from_slice(data).is_err() {
                        return Vec::new();
                    }
                    addresses.push(self.pubkey_address(data));
                }
                _ => break,
            }
        }
        addresses
    }
}

fn base58_address(prefix: &[u8], hash: &[u8]) -> String {
    let mut payload = Vec::with_capacity(prefix.len() + hash.len());
    payload.extend_from_slice(prefix);
    payload.extend_from_slice(hash);
    base58::check_encode_slice(&payload)
}

fn hash_payload<'p>(hash: &'p [u8], address: &str) -> ParseResult<&'p [u8]> {
    if hash.len() != 20 {
        return Err(ParseError::InvalidAddress(format!(
            "{}: payload of {} bytes, expected 20",
            address,
            hash.len()
        )));
    }
    Ok(hash)
}

pub(crate) fn p2pkh_script(hash: &[u8]) -> Vec<u8> {
    let mut s = Vec::with_capacity(25);
    s.extend_from_slice(&[OP_DUP, OP_HASH160, 0x14]);
    s.extend_from_slice(hash);
    s.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    s
}

pub(crate) fn p2sh_script(hash: &[u8]) -> Vec<u8> {
    let mut s = Vec::with_capacity(23);
    s.extend_from_slice(&[OP_HASH160, 0x14]);
    s.extend_from_slice(hash);
    s.push(OP_EQUAL);
    s
}

pub(crate) fn witness_script(version: u8, program: &[u8]) -> Vec<u8> {
    let mut s = Vec::with_capacity(program.len() + 2);
    s.push(if version == 0 { OP_0 } else { OP_1 + version - 1 });
    s.push(program.len() as u8);
    s.extend_from_slice(program);
    s
}

///
/// Split a witness program into version and program bytes.
///
fn witness_program(s: &[u8]) -> Option<(u8, &[u8])> {
    if s.len() < 4 || s.len() > 42 {
        return None;
    }
    let version = match s[0] {
        OP_0 => 0,
        op if (OP_1..=OP_16).contains(&op) => op - OP_1 + 1,
        _ => return None,
    };
    if s[1] as usize != s.len() - 2 {
        return None;
    }
    Some((version, &s[2..]))
}

/// public key of a `<pubkey> OP_CHECKSIG` script, if it lies on the curve
fn p2pk_key(script: &Script) -> Option<&[u8]> {
    match script.instructions().next() {
        Some(Ok(PushBytes(key))) if PublicKey::from_slice(key).is_ok() => Some(key),
        _ => None,
    }
}

///
/// translated from Bitcoinj:
/// [isSentToMultisig()](https://github.com/bitcoinj/bitcoinj/blob/d3d5edbcbdb91b25de4df3b6ed6740d7e2329efc/core/src/main/java/org/bitcoinj/script/ScriptPattern.java#L225:L246)
fn is_multisig(script: &Script) -> bool {
    match script.as_bytes().last() {
        Some(op) if *op == all::OP_CHECKMULTISIG.into_u8() => {}
        _ => return false,
    }
    let mut chunks: Vec<Instruction> = Vec::new();
    for i in script.instructions() {
        match i {
            Ok(i) => chunks.push(i),
            Err(_) => return false,
        }
    }

    // At least four chunks
    if chunks.len() < 4 {
        return false;
    }

    // Second to last chunk must be an OP_N opcode and there should be that many data chunks (keys).
    let num_keys = match get_num_keys(&chunks[chunks.len() - 2]) {
        Some(n) => n,
        None => return false,
    };
    if num_keys < 1 || num_keys + 3 != chunks.len() {
        return false;
    }

    // the rest must be data (except the first and the last 2)
    for chunk in chunks.iter().skip(1).take(chunks.len() - 3) {
        if let Op(_) = chunk {
            return false;
        }
    }

    // First chunk must be an OP_N opcode too, and no larger than the key count.
    match get_num_keys(&chunks[0]) {
        Some(required) => required >= 1 && required <= num_keys,
        None => false,
    }
}

///
/// Decode OP_1 .. OP_16.
///
#[inline]
fn get_num_keys(op: &Instruction) -> Option<usize> {
    match op {
        PushBytes(_) => None,
        Op(op) => {
            let op = op.into_u8();
            if (OP_1..=OP_16).contains(&op) {
                Some((op - OP_1 + 1) as usize)
            } else {
                None
            }
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScriptType::Pay2PublicKeyHash => write!(f, "Pay2PublicKeyHash"),
            ScriptType::Pay2ScriptHash => write!(f, "Pay2ScriptHash"),
            ScriptType::Pay2WitnessPublicKeyHash => write!(f, "Pay2WitnessPublicKeyHash"),
            ScriptType::Pay2WitnessScriptHash => write!(f, "Pay2WitnessScriptHash"),
            ScriptType::WitnessProgram => write!(f, "WitnessProgram"),
            ScriptType::Pay2PublicKey => write!(f, "Pay2PublicKey"),
            ScriptType::Pay2MultiSig => write!(f, "Pay2MultiSig"),
            ScriptType::NullData => write!(f, "NullData"),
            ScriptType::NonStandard => write!(f, "NonStandard"),
        }
    }
}
