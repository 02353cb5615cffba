//! EVM Adapter
//!
//! Typed read/write facade over one JSON-RPC gateway. Each adapter is
//! bound to a single chain for the duration of a tick; the monitor
//! holds one for the home chain and one for the remote chain.
//!
//! Every network future is bounded by a deadline: 60 s for reads and
//! broadcasts, 120 s for the confirmation wait. Failures surface as
//! distinct [`MonitorError`] kinds so the orchestrator can map them to
//! exit codes; contract reverts carry the error selector verbatim.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::Tokenize;
use ethers::contract::{Contract, ContractError};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256, U256};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::chain_adapters::abis;
use crate::errors::{MonitorError, Result};

/// Ceiling for a single RPC read or broadcast.
const IO_TIMEOUT: Duration = Duration::from_secs(60);

/// Ceiling for the one-confirmation wait after broadcast.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(120);

/// Adapter for one EVM chain endpoint.
pub struct EvmAdapter {
    /// Human label used in errors and logs.
    label: String,
    provider: Provider<Http>,
}

impl EvmAdapter {
    /// Connect to a chain through a host-vended gateway URL.
    pub fn connect(label: &str, gateway_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(gateway_url).map_err(|e| {
            MonitorError::ConfigMissing(format!("invalid gateway URL for {}: {}", label, e))
        })?;

        debug!(chain = label, "endpoint client created");
        Ok(Self {
            label: label.to_string(),
            provider,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `balanceOf(holder)` on an ERC-20 token, decoded as `uint256`.
    pub async fn call_balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        self.call_u256(token, "balanceOf", holder).await
    }

    /// `totalSupply()` on an ERC-20/OFT token, decoded as `uint256`.
    pub async fn call_total_supply(&self, token: Address) -> Result<U256> {
        self.call_u256(token, "totalSupply", ()).await
    }

    /// Read a `uint256`-returning view method at the latest confirmed
    /// block known to this provider.
    async fn call_u256<T: Tokenize>(&self, to: Address, method: &str, args: T) -> Result<U256> {
        let contract = Contract::new(
            to,
            abis::monitor_abi().clone(),
            Arc::new(self.provider.clone()),
        );
        let call = contract
            .method::<T, U256>(method, args)
            .map_err(|e| MonitorError::RpcDecode {
                chain: self.label.clone(),
                reason: e.to_string(),
            })?;

        match timeout(IO_TIMEOUT, call.call()).await {
            Err(_) => Err(MonitorError::RpcTransport {
                chain: self.label.clone(),
                reason: format!("{} timed out after {:?}", method, IO_TIMEOUT),
            }),
            Ok(Err(e)) => Err(self.map_call_error(e)),
            Ok(Ok(value)) => {
                debug!(chain = %self.label, method, value = %value, "view call decoded");
                Ok(value)
            }
        }
    }

    /// Build, sign and broadcast `resetPeer(peer_chain_id)` against
    /// `target`, then wait for the requested number of confirmations.
    ///
    /// Returns the transaction hash of the included transaction. No
    /// retry on any failure; a transaction already accepted by a
    /// mempool may still land after an error here, which is accepted
    /// because `resetPeer` is idempotent in effect.
    pub async fn send_reset_peer(
        &self,
        wallet: LocalWallet,
        target: Address,
        peer_chain_id: u32,
        confirmations: usize,
    ) -> Result<H256> {
        let chain_id = match timeout(IO_TIMEOUT, self.provider.get_chainid()).await {
            Err(_) => {
                return Err(MonitorError::RpcTransport {
                    chain: self.label.clone(),
                    reason: "chain id query timed out".to_string(),
                })
            }
            Ok(Err(e)) => {
                return Err(MonitorError::RpcTransport {
                    chain: self.label.clone(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(id)) => id,
        };

        let wallet = wallet.with_chain_id(chain_id.as_u64());
        let client = Arc::new(SignerMiddleware::new(self.provider.clone(), wallet));
        let contract = Contract::new(target, abis::monitor_abi().clone(), client);

        let call = contract
            .method::<_, ()>("resetPeer", peer_chain_id)
            .map_err(|e| MonitorError::RpcDecode {
                chain: self.label.clone(),
                reason: e.to_string(),
            })?;

        let pending = match timeout(IO_TIMEOUT, call.send()).await {
            Err(_) => {
                return Err(MonitorError::BroadcastRejected {
                    chain: self.label.clone(),
                    reason: format!("broadcast timed out after {:?}", IO_TIMEOUT),
                })
            }
            Ok(Err(e)) => return Err(self.map_send_error(e)),
            Ok(Ok(pending)) => pending,
        };

        let tx_hash: H256 = *pending;
        info!(
            chain = %self.label,
            tx_hash = ?tx_hash,
            "resetPeer broadcast, awaiting confirmation"
        );

        match timeout(CONFIRM_TIMEOUT, pending.confirmations(confirmations)).await {
            Err(_) => Err(MonitorError::ConfirmationTimeout {
                chain: self.label.clone(),
                tx_hash: format!("{:?}", tx_hash),
            }),
            Ok(Err(e)) => Err(MonitorError::BroadcastRejected {
                chain: self.label.clone(),
                reason: e.to_string(),
            }),
            Ok(Ok(None)) => Err(MonitorError::BroadcastRejected {
                chain: self.label.clone(),
                reason: "transaction dropped before inclusion".to_string(),
            }),
            Ok(Ok(Some(receipt))) => {
                info!(
                    chain = %self.label,
                    tx_hash = ?receipt.transaction_hash,
                    block = ?receipt.block_number,
                    "resetPeer confirmed"
                );
                Ok(receipt.transaction_hash)
            }
        }
    }

    fn map_call_error<M: Middleware>(&self, err: ContractError<M>) -> MonitorError {
        match err {
            ContractError::Revert(data) => MonitorError::ContractRevert {
                chain: self.label.clone(),
                selector: revert_selector(&data),
            },
            ContractError::DecodingError(e) => MonitorError::RpcDecode {
                chain: self.label.clone(),
                reason: e.to_string(),
            },
            ContractError::DetokenizationError(e) => MonitorError::RpcDecode {
                chain: self.label.clone(),
                reason: e.to_string(),
            },
            other => MonitorError::RpcTransport {
                chain: self.label.clone(),
                reason: other.to_string(),
            },
        }
    }

    fn map_send_error<M: Middleware>(&self, err: ContractError<M>) -> MonitorError {
        match err {
            ContractError::Revert(data) => MonitorError::ContractRevert {
                chain: self.label.clone(),
                selector: revert_selector(&data),
            },
            other => MonitorError::BroadcastRejected {
                chain: self.label.clone(),
                reason: other.to_string(),
            },
        }
    }
}

/// First four bytes of the revert data as hex, verbatim.
fn revert_selector(data: &Bytes) -> String {
    let take = data.len().min(4);
    format!("0x{}", hex::encode(&data[..take]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_selector_extraction() {
        let data = Bytes::from(vec![0x08, 0xc3, 0x79, 0xa0, 0xff, 0xff]);
        assert_eq!(revert_selector(&data), "0x08c379a0");

        let short = Bytes::from(vec![0xde, 0xad]);
        assert_eq!(revert_selector(&short), "0xdead");

        let empty = Bytes::default();
        assert_eq!(revert_selector(&empty), "0x");
    }

    #[test]
    fn test_connect_rejects_garbage_url() {
        let err = EvmAdapter::connect("mainnet", "not a url")
            .err()
            .expect("garbage URL must be rejected");
        assert!(matches!(err, MonitorError::ConfigMissing(_)));
    }

    #[test]
    fn test_connect_accepts_gateway_url() {
        let adapter = EvmAdapter::connect("mainnet", "https://rpc.example/v1").expect("connect");
        assert_eq!(adapter.label(), "mainnet");
    }
}
