//! ABI subset consumed by the monitor
//!
//! The monitor treats the on-chain contracts as opaque callees and
//! only needs three methods: `balanceOf` on the home token,
//! `totalSupply` on the remote OFT, and the privileged `resetPeer`
//! on whichever side is configured as the breaker.

use ethers::abi::Abi;
use once_cell::sync::Lazy;

/// JSON ABI covering the monitor's whole contract surface.
pub const MONITOR_ABI_JSON: &str = r#"[
  {
    "type": "function",
    "name": "balanceOf",
    "stateMutability": "view",
    "inputs": [{ "name": "account", "type": "address" }],
    "outputs": [{ "name": "", "type": "uint256" }]
  },
  {
    "type": "function",
    "name": "totalSupply",
    "stateMutability": "view",
    "inputs": [],
    "outputs": [{ "name": "", "type": "uint256" }]
  },
  {
    "type": "function",
    "name": "resetPeer",
    "stateMutability": "nonpayable",
    "inputs": [{ "name": "peerChainId", "type": "uint32" }],
    "outputs": []
  }
]"#;

static MONITOR_ABI: Lazy<Abi> =
    Lazy::new(|| serde_json::from_str(MONITOR_ABI_JSON).expect("static monitor ABI is valid"));

/// Parsed monitor ABI.
pub fn monitor_abi() -> &'static Abi {
    &MONITOR_ABI
}
