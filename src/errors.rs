//! # Monitor Error Management
//!
//! Centralized error enum for the whole monitor, plus the tick-level
//! failure wrapper that maps errors onto the exit codes the scheduler
//! understands.
//!
//! Every module returns [`MonitorError`]; the tick orchestrator wraps
//! the error with the state-machine phase it occurred in so that the
//! binary can report `20` (sampler), `21` (signer/broadcast) or `22`
//! (config/secret) without the individual components knowing about
//! process exit codes.

use thiserror::Error;

/// Common result type for the monitor.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Centralized error enum for the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A required configuration value is absent or invalid.
    #[error("Configuration error: {0}")]
    ConfigMissing(String),

    /// A required secret could not be resolved from the host.
    #[error("Secret not available: {0}")]
    SecretMissing(String),

    /// Transport-level RPC failure (connection, timeout, JSON-RPC error).
    #[error("RPC transport error on {chain}: {reason}")]
    RpcTransport { chain: String, reason: String },

    /// The RPC answered but the return data could not be decoded.
    #[error("RPC decode error on {chain}: {reason}")]
    RpcDecode { chain: String, reason: String },

    /// The contract reverted; `selector` carries the error selector
    /// from the revert data verbatim.
    #[error("Contract revert on {chain}: selector {selector}")]
    ContractRevert { chain: String, selector: String },

    /// The monitor key could not be turned into a usable signer.
    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    /// The signed transaction was rejected before entering a mempool.
    #[error("Broadcast rejected on {chain}: {reason}")]
    BroadcastRejected { chain: String, reason: String },

    /// The transaction was broadcast but did not confirm in time.
    #[error("Confirmation timeout on {chain} for tx {tx_hash}")]
    ConfirmationTimeout { chain: String, tx_hash: String },

    /// The out-of-band alert channel failed. Recovered locally on most
    /// paths; never aborts a tick on its own.
    #[error("Notifier failure: {0}")]
    NotifierFailure(String),
}

/// State-machine phase a tick failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Config load, gateway resolution, secret fetch, signer setup.
    Setup,
    /// Balance sampling on either leg.
    Sample,
    /// `resetPeer` broadcast or confirmation wait.
    Trip,
}

/// A failed tick: the error plus where in the state machine it happened.
#[derive(Debug, Error)]
#[error("tick failed during {phase:?}: {source}")]
pub struct TickFailure {
    pub phase: TickPhase,
    #[source]
    pub source: MonitorError,
}

impl TickFailure {
    pub fn new(phase: TickPhase, source: MonitorError) -> Self {
        Self { phase, source }
    }

    /// Exit code for the scheduler: `20` sampler, `21` signer/broadcast,
    /// `22` config/secret. A signer error is `21` regardless of phase.
    pub fn exit_code(&self) -> i32 {
        match (&self.phase, &self.source) {
            (_, MonitorError::SignerUnavailable(_)) => 21,
            (TickPhase::Setup, _) => 22,
            (TickPhase::Sample, _) => 20,
            (TickPhase::Trip, _) => 21,
        }
    }
}
