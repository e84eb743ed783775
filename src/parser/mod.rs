//!
//! This module defines how to decode consensus bytes into the structs
//! defined in proto, and how to pack them for storage.
//!

/// define binary readers and writers over byte buffers
pub mod reader;

/// classify output scripts and convert between addresses and scripts
pub mod script;

/// consensus transaction decoding and encoding
pub mod transaction;

/// consensus block decoding
pub mod block;

/// packed storage records
pub mod packed;

/// various formats of blockchain data representation
pub mod proto;

/// error handling
pub mod errors;
