//! Circuit breaker
//!
//! Disarms the bridge by invoking the privileged `resetPeer` call on
//! the configured side. The monitor key is a hot key whose only
//! on-chain privilege is `resetPeer`; it is parsed once per tick from
//! zeroizing storage and signs nothing except this one call against
//! the configured Adapter/OFT address.
//!
//! At-most-once per tick: a failed broadcast is reported, never
//! retried. Calling `resetPeer` on an already-reset peer is harmless,
//! so the next tick re-tripping is acceptable.

use async_trait::async_trait;
use ethers::signers::LocalWallet;
use ethers::types::{Address, H256};
use tracing::warn;
use zeroize::Zeroizing;

use crate::chain_adapters::EvmAdapter;
use crate::checker::Divergence;
use crate::config::MonitorConfig;
use crate::errors::{MonitorError, Result};
use crate::types::BreakerSide;

/// Confirmations waited for after broadcasting the reset.
const RESET_CONFIRMATIONS: usize = 1;

/// Interface for tripping the bridge breaker.
#[async_trait]
pub trait Breaker: Send + Sync {
    /// Broadcast `resetPeer` and wait for one confirmation. Returns the
    /// hash of the included transaction.
    async fn trip(&self, divergence: &Divergence) -> Result<H256>;
}

/// Breaker acting on one live chain endpoint.
pub struct PeerBreaker<'a> {
    endpoint: &'a EvmAdapter,
    target: Address,
    peer_chain_id: u32,
    wallet: LocalWallet,
}

impl<'a> PeerBreaker<'a> {
    /// Build the breaker for the configured side. The raw key is
    /// dropped (and zeroized) before this returns.
    pub fn new(
        cfg: &MonitorConfig,
        home: &'a EvmAdapter,
        remote: &'a EvmAdapter,
        key: Zeroizing<String>,
    ) -> Result<Self> {
        let wallet = key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| MonitorError::SignerUnavailable(e.to_string()))?;

        let endpoint = match cfg.breaker_side {
            BreakerSide::Home => home,
            BreakerSide::Remote => remote,
        };

        Ok(Self {
            endpoint,
            target: cfg.breaker_target(),
            peer_chain_id: cfg.peer_chain_id,
            wallet,
        })
    }
}

#[async_trait]
impl Breaker for PeerBreaker<'_> {
    async fn trip(&self, divergence: &Divergence) -> Result<H256> {
        warn!(
            chain = self.endpoint.label(),
            target = ?self.target,
            peer_chain_id = self.peer_chain_id,
            delta = %divergence.delta_text(),
            "tripping bridge breaker"
        );

        self.endpoint
            .send_reset_peer(
                self.wallet.clone(),
                self.target,
                self.peer_chain_id,
                RESET_CONFIRMATIONS,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(side: &str) -> MonitorConfig {
        serde_yaml::from_str(&format!(
            r#"
home_network: mainnet
remote_network: polygon
token_address: "0x541Ae71C06fbFAE89AcD99149dC95B0965971E37"
adapter_address: "0xD8Cd4fB967De89A10D1db89daC7D103EB22509EB"
oft_address: "0xa044Ee26D29CF2E8bE374AdF23fc90d528A9eC42"
breaker_side: {side}
peer_chain_id: 137
label_prefix: "MOCA_ETH"
explorer_tx_url_template: "https://etherscan.io/tx/%s"
"#
        ))
        .expect("test config parses")
    }

    fn adapters() -> (EvmAdapter, EvmAdapter) {
        (
            EvmAdapter::connect("mainnet", "https://rpc.example/home").expect("home"),
            EvmAdapter::connect("polygon", "https://rpc.example/remote").expect("remote"),
        )
    }

    // A valid secp256k1 key for tests only; never funded anywhere.
    const TEST_KEY: &str = "0x0123456789012345678901234567890123456789012345678901234567890123";

    #[test]
    fn test_home_side_targets_adapter_contract() {
        let cfg = test_config("home");
        let (home, remote) = adapters();
        let breaker = PeerBreaker::new(&cfg, &home, &remote, Zeroizing::new(TEST_KEY.into()))
            .expect("breaker");
        assert_eq!(breaker.target, cfg.adapter_address);
        assert_eq!(breaker.endpoint.label(), "mainnet");
        assert_eq!(breaker.peer_chain_id, 137);
    }

    #[test]
    fn test_remote_side_targets_oft_contract() {
        let cfg = test_config("remote");
        let (home, remote) = adapters();
        let breaker = PeerBreaker::new(&cfg, &home, &remote, Zeroizing::new(TEST_KEY.into()))
            .expect("breaker");
        assert_eq!(breaker.target, cfg.oft_address);
        assert_eq!(breaker.endpoint.label(), "polygon");
    }

    #[test]
    fn test_bad_key_is_signer_unavailable() {
        let cfg = test_config("home");
        let (home, remote) = adapters();
        let err = PeerBreaker::new(&cfg, &home, &remote, Zeroizing::new("feed".into()))
            .err()
            .expect("invalid key must be rejected");
        assert!(matches!(err, MonitorError::SignerUnavailable(_)));
    }
}
