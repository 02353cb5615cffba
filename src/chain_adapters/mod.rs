//! Module chain_adapters
//!
//! Connectivity to the two chain endpoints the monitor watches:
//! - EVM adapter: typed read/write facade over one JSON-RPC gateway
//! - ABI subset: the three contract methods the monitor consumes

pub mod abis;
pub mod evm_adapter;

pub use evm_adapter::EvmAdapter;
