//!
//! ## Data Types
//!
//! - `Transaction`, `Input`, `Output`: structured transaction, as decoded
//!   from consensus bytes or restored from a packed record.
//! - `Block`, `BlockHeader`: structured block.
//! - `ProtoTransaction`: the packed storage record layout.
//!
//! All types are plain owned values; nothing here keeps references
//! into the buffers they were decoded from.
//!

/// 32 byte hashes, transactions, inputs and outputs
pub mod tx_proto;

/// blocks and block headers
pub mod block_proto;

/// protobuf layout of the packed storage record
pub mod packed_proto;
