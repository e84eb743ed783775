//!
//! Packed storage record.
//!
//! Layout is shared with records already written by the indexer, so tags
//! and presence rules are fixed: scalars and `coinbase` are always written
//! (hence `optional`), byte fields only when non-empty.
//!
//! 32 bit fields are declared 64 bit: the varint bytes are identical for
//! in-range values, and decoding can then detect overflow instead of
//! silently truncating.
//!

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTransaction {
    #[prost(bytes = "vec", tag = "1")]
    pub txid: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub hex: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, optional, tag = "3")]
    pub blocktime: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub locktime: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub height: ::core::option::Option<u64>,
    #[prost(message, repeated, tag = "6")]
    pub vin: ::prost::alloc::vec::Vec<ProtoVin>,
    #[prost(message, repeated, tag = "7")]
    pub vout: ::prost::alloc::vec::Vec<ProtoVout>,
    #[prost(int64, optional, tag = "8")]
    pub version: ::core::option::Option<i64>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoVin {
    /// hex of the coinbase data, empty string for regular inputs
    #[prost(string, optional, tag = "1")]
    pub coinbase: ::core::option::Option<::prost::alloc::string::String>,
    /// previous txid in display order; absent for coinbase inputs
    #[prost(bytes = "vec", tag = "2")]
    pub txid: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, optional, tag = "3")]
    pub vout: ::core::option::Option<u64>,
    #[prost(bytes = "vec", tag = "4")]
    pub script_sig: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, optional, tag = "5")]
    pub sequence: ::core::option::Option<u64>,
    #[prost(string, repeated, tag = "6")]
    pub addresses: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoVout {
    /// big-endian value without leading zeros
    #[prost(bytes = "vec", tag = "1")]
    pub value: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, optional, tag = "2")]
    pub n: ::core::option::Option<u64>,
    #[prost(bytes = "vec", tag = "3")]
    pub script_pubkey: ::prost::alloc::vec::Vec<u8>,
    /// written for readers of the raw record; ignored when unpacking
    #[prost(string, repeated, tag = "4")]
    pub addresses: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
