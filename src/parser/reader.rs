use crate::parser::errors::{ParseError, ParseResult};
use crate::parser::proto::tx_proto::Hash256;
use bitcoin::consensus::encode::{self, serialize, Decodable, VarInt};
use byteorder::{LittleEndian, ReadBytesExt};
use num_bigint::BigUint;
use std::io::{Cursor, Read};

///
/// Bounds-checked readers for consensus-encoded data.
///
/// Every read names the field it is reading so truncation errors say
/// where the input ran out. Lengths are checked against the remaining
/// bytes before anything is allocated.
///
pub trait BlockchainRead: Read {
    /// bytes left to read
    fn remaining(&self) -> usize;

    /// CompactSize integer; non-minimal encodings are rejected
    fn read_varint(&mut self, field: &'static str) -> ParseResult<u64> {
        match VarInt::consensus_decode(&mut *self) {
            Ok(VarInt(n)) => Ok(n),
            Err(encode::Error::NonMinimalVarInt) => {
                Err(ParseError::MalformedCount { field, count: 0 })
            }
            Err(_) => Err(ParseError::TruncatedInput { field }),
        }
    }

    ///
    /// Read a count prefix and check that `count` items of at least
    /// `min_item_size` bytes each can fit in what is left.
    ///
    fn read_count(&mut self, field: &'static str, min_item_size: usize) -> ParseResult<usize> {
        let count = self.read_varint(field)?;
        let fits = (count as u128) * (min_item_size as u128) <= self.remaining() as u128;
        if !fits {
            return Err(ParseError::MalformedCount { field, count });
        }
        Ok(count as usize)
    }

    #[inline]
    fn read_u32(&mut self, field: &'static str) -> ParseResult<u32> {
        ReadBytesExt::read_u32::<LittleEndian>(self).map_err(ParseError::truncated(field))
    }

    #[inline]
    fn read_i32(&mut self, field: &'static str) -> ParseResult<i32> {
        ReadBytesExt::read_i32::<LittleEndian>(self).map_err(ParseError::truncated(field))
    }

    #[inline]
    fn read_hash(&mut self, field: &'static str) -> ParseResult<Hash256> {
        let mut arr = [0u8; 32];
        self.read_exact(&mut arr)
            .map_err(ParseError::truncated(field))?;
        Ok(Hash256(arr))
    }

    fn read_u8_vec(&mut self, len: usize, field: &'static str) -> ParseResult<Vec<u8>> {
        if len > self.remaining() {
            return Err(ParseError::TruncatedInput { field });
        }
        let mut arr = vec![0u8; len];
        self.read_exact(&mut arr)
            .map_err(ParseError::truncated(field))?;
        Ok(arr)
    }

    /// CompactSize length followed by that many bytes
    fn read_var_bytes(&mut self, field: &'static str) -> ParseResult<Vec<u8>> {
        let len = self.read_varint(field)?;
        if len > self.remaining() as u64 {
            return Err(ParseError::TruncatedInput { field });
        }
        self.read_u8_vec(len as usize, field)
    }

    /// little-endian unsigned amount of `width` bytes
    fn read_amount(&mut self, width: usize, field: &'static str) -> ParseResult<BigUint> {
        let bytes = self.read_u8_vec(width, field)?;
        Ok(BigUint::from_bytes_le(&bytes))
    }
}

impl BlockchainRead for Cursor<&[u8]> {
    #[inline]
    fn remaining(&self) -> usize {
        self.get_ref().len().saturating_sub(self.position() as usize)
    }
}

///
/// Consensus encoding writers. Writing into memory cannot fail.
///
pub trait BlockchainWrite {
    fn write_varint(&mut self, n: u64);
    fn write_u32(&mut self, n: u32);
    fn write_i32(&mut self, n: i32);
    fn write_var_bytes(&mut self, bytes: &[u8]);

    /// little-endian amount padded to `width` bytes
    fn write_amount(&mut self, value: &BigUint, width: usize) -> ParseResult<()>;
}

impl BlockchainWrite for Vec<u8> {
    #[inline]
    fn write_varint(&mut self, n: u64) {
        self.extend_from_slice(&serialize(&VarInt(n)));
    }

    #[inline]
    fn write_u32(&mut self, n: u32) {
        self.extend_from_slice(&n.to_le_bytes());
    }

    #[inline]
    fn write_i32(&mut self, n: i32) {
        self.extend_from_slice(&n.to_le_bytes());
    }

    fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.extend_from_slice(bytes);
    }

    fn write_amount(&mut self, value: &BigUint, width: usize) -> ParseResult<()> {
        let mut bytes = value.to_bytes_le();
        // zero encodes as a single 0x00
        while bytes.len() > 1 && bytes.last() == Some(&0) {
            bytes.pop();
        }
        if bytes.len() > width {
            return Err(ParseError::AmountOverflow { width });
        }
        bytes.resize(width, 0);
        self.extend_from_slice(&bytes);
        Ok(())
    }
}
