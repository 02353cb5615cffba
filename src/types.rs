//! Types module
//!
//! Core types shared across the monitor: the side selection for the
//! circuit breaker, the per-tick balance reading, and the terminal
//! outcome reported back to the scheduler.

use chrono::{DateTime, Utc};
use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};

/// Which chain the `resetPeer` call is sent to when a divergence is
/// detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakerSide {
    /// Break the bridge from the home chain (the token Adapter contract).
    Home,
    /// Break the bridge from the remote chain (the OFT contract).
    Remote,
}

impl std::fmt::Display for BreakerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerSide::Home => write!(f, "home"),
            BreakerSide::Remote => write!(f, "remote"),
        }
    }
}

/// One pair of on-chain reads taken during a tick.
///
/// Both values come from the latest-confirmed block known to each
/// provider. The two reads are not snapshot-consistent across chains;
/// a transient divergence during in-flight bridge delivery is expected
/// and accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    /// Token balance locked in the Adapter on the home chain.
    pub adapter_balance: U256,
    /// Total supply minted by the OFT on the remote chain.
    pub oft_supply: U256,
    /// When both legs completed.
    pub sampled_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(adapter_balance: U256, oft_supply: U256) -> Self {
        Self {
            adapter_balance,
            oft_supply,
            sampled_at: Utc::now(),
        }
    }
}

/// Terminal state of a successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Balances matched; nothing was broadcast.
    Equal,
    /// Divergence detected and `resetPeer` confirmed on-chain.
    Tripped(H256),
}

impl TickOutcome {
    /// Process exit code reported to the scheduler.
    pub fn exit_code(&self) -> i32 {
        match self {
            TickOutcome::Equal => 0,
            TickOutcome::Tripped(_) => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TickOutcome::Equal => "equal",
            TickOutcome::Tripped(_) => "tripped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(TickOutcome::Equal.exit_code(), 0);
        assert_eq!(TickOutcome::Tripped(H256::zero()).exit_code(), 10);
    }

    #[test]
    fn test_breaker_side_serde() {
        let side: BreakerSide = serde_yaml::from_str("home").expect("parse");
        assert_eq!(side, BreakerSide::Home);
        let side: BreakerSide = serde_yaml::from_str("remote").expect("parse");
        assert_eq!(side, BreakerSide::Remote);
        assert_eq!(side.to_string(), "remote");
    }
}
