//! Notifications module
//!
//! Out-of-band operator alerts over Telegram. The notifier never
//! decides control flow by itself: the tick orchestrator owns the
//! policy for which failures are swallowed and which are escalated.
//! Message text contains balances and transaction hashes only, never
//! secrets.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use zeroize::Zeroizing;

use crate::checker::Divergence;
use crate::config::MonitorConfig;
use crate::errors::{MonitorError, Result};
use crate::types::Reading;

/// What a notification is about; used for log context only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Healthy tick, balances equal.
    Healthy,
    /// Divergence detected, breaker about to fire.
    Divergence,
    /// `resetPeer` confirmed on-chain.
    TripReceipt,
    /// `resetPeer` broadcast or confirmation failed.
    TripFailure,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Healthy => "healthy",
            AlertKind::Divergence => "divergence",
            AlertKind::TripReceipt => "trip_receipt",
            AlertKind::TripFailure => "trip_failure",
        }
    }
}

/// Interface for the out-of-band alert channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: AlertKind, text: &str) -> Result<()>;
}

/// Telegram alert channel.
pub struct TelegramNotifier {
    /// Bot token; kept zeroizing and out of any Debug output.
    token: Zeroizing<String>,
    chat_id: String,
    client: Client,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(token: Zeroizing<String>, chat_id: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            token,
            chat_id,
            client,
            api_base: "https://api.telegram.org".to_string(),
        })
    }
}

/// The request URL embeds the bot token, and reqwest's error Display
/// echoes the URL. Strip it before the error becomes loggable text.
fn transport_error(e: reqwest::Error) -> MonitorError {
    MonitorError::NotifierFailure(e.without_url().to_string())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, kind: AlertKind, text: &str) -> Result<()> {
        let api_url = format!("{}/bot{}/sendMessage", self.api_base, &*self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(&api_url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            debug!(kind = kind.as_str(), "telegram notification delivered");
            Ok(())
        } else {
            Err(MonitorError::NotifierFailure(format!(
                "telegram returned HTTP {}",
                response.status()
            )))
        }
    }
}

/// Healthy-path message.
pub fn healthy_text(cfg: &MonitorConfig) -> String {
    format!("{}\nBalances are equal", cfg.label_prefix)
}

/// Divergence alert, sent before the breaker fires.
pub fn alert_text(cfg: &MonitorConfig, reading: &Reading, divergence: &Divergence) -> String {
    format!(
        "{}\n\nAdapter Balance: {}\nOFT Balance: {}\nDelta: {}\nDeltaTokens: {}",
        cfg.label_prefix,
        reading.adapter_balance,
        reading.oft_supply,
        divergence.delta_text(),
        divergence.delta_tokens_text(),
    )
}

/// Receipt message after the reset transaction confirmed.
pub fn receipt_text(cfg: &MonitorConfig, tx_hash: ethers::types::H256) -> String {
    format!(
        "{}\nresetPeer() called successfully on {}.\n{}",
        cfg.label_prefix,
        cfg.breaker_label(),
        cfg.explorer_url(tx_hash),
    )
}

/// Failure message when the trip itself failed.
pub fn trip_failure_text(cfg: &MonitorConfig, error: &MonitorError) -> String {
    format!(
        "{}\nresetPeer() FAILED on {}: {}",
        cfg.label_prefix,
        cfg.breaker_label(),
        error,
    )
}
