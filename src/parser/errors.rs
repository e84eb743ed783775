//!
//! Error types shared by all codecs.
//!
//! Malformed bytes are never transient, so nothing here is retried:
//! every failure is handed back to the caller, who decides whether to
//! re-fetch, skip or abort.
//!

use std::io;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A declared length or fixed-size field runs past the end of a transaction.
    #[error("truncated input while reading {field}")]
    TruncatedInput { field: &'static str },

    /// The block header or transaction list runs past the end of the block.
    #[error("truncated block: {0}")]
    TruncatedBlock(String),

    /// A count prefix cannot possibly be satisfied by the remaining bytes,
    /// or is not minimally encoded (reported with a count of 0).
    #[error("malformed count for {field}: {count}")]
    MalformedCount { field: &'static str, count: u64 },

    /// Decoding finished with unread bytes left over.
    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The packed storage record violates its layout.
    #[error("corrupt packed record: {0}")]
    CorruptRecord(String),

    /// An amount does not fit the fixed width it has to be written with.
    #[error("amount does not fit in {width} bytes")]
    AmountOverflow { width: usize },

    #[error("invalid chain parameters: {0}")]
    InvalidParams(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl ParseError {
    ///
    /// Map an io failure while reading `field` from an in-memory cursor.
    ///
    /// Reading from a byte slice can only fail by running out of bytes.
    ///
    pub(crate) fn truncated(field: &'static str) -> impl FnOnce(io::Error) -> ParseError {
        move |_| ParseError::TruncatedInput { field }
    }

    ///
    /// Re-classify a transaction-level truncation as a block-level one.
    ///
    pub(crate) fn into_block_error(self) -> ParseError {
        match self {
            ParseError::TruncatedInput { field } => {
                ParseError::TruncatedBlock(format!("transaction {} runs past block end", field))
            }
            ParseError::MalformedCount { field, count } if count > 0 => ParseError::TruncatedBlock(
                format!("transaction {} of {} runs past block end", field, count),
            ),
            other => other,
        }
    }
}

impl From<prost::DecodeError> for ParseError {
    fn from(err: prost::DecodeError) -> Self {
        ParseError::CorruptRecord(err.to_string())
    }
}

impl From<bitcoin_hashes::hex::Error> for ParseError {
    fn from(err: bitcoin_hashes::hex::Error) -> Self {
        ParseError::InvalidHex(err.to_string())
    }
}
