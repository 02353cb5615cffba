//! Tick orchestrator
//!
//! One scheduler trigger drives exactly one pass through this state
//! machine:
//!
//! ```text
//!   START ─sample─▶ SAMPLED
//!   SAMPLED ─equal──────▶ NOTIFY_OK  ─▶ DONE
//!   SAMPLED ─diverged──▶ NOTIFY_ALERT ─▶ TRIP ─success─▶ NOTIFY_RECEIPT ─▶ DONE
//!                                            └fail─▶ NOTIFY_TRIP_FAIL ─▶ FAILED
//! ```
//!
//! All state is tick-scoped; nothing survives into the next trigger.
//! The breaker fires at most once, and only after the alert
//! notification has been attempted. Notifier failures never suppress
//! the trip.

use tracing::{error, info, warn};

use crate::breaker::{Breaker, PeerBreaker};
use crate::chain_adapters::EvmAdapter;
use crate::checker::{self, CheckOutcome};
use crate::config::MonitorConfig;
use crate::errors::{MonitorError, TickFailure, TickPhase};
use crate::notifications::{
    alert_text, healthy_text, receipt_text, trip_failure_text, AlertKind, Notifier,
    TelegramNotifier,
};
use crate::sampler::{BalanceSampler, Sampler};
use crate::secrets::{gateway_url, SecretStore};
use crate::types::TickOutcome;

/// Drive one tick from sample to terminal state.
pub async fn run_state_machine(
    sampler: &dyn Sampler,
    breaker: &dyn Breaker,
    notifier: &dyn Notifier,
    cfg: &MonitorConfig,
) -> Result<TickOutcome, TickFailure> {
    let reading = sampler
        .sample()
        .await
        .map_err(|e| TickFailure::new(TickPhase::Sample, e))?;

    match checker::check(&reading) {
        CheckOutcome::Equal => {
            info!("balances are equal");
            if let Err(e) = notifier.notify(AlertKind::Healthy, &healthy_text(cfg)).await {
                warn!(error = %e, "healthy notification failed");
            }
            Ok(TickOutcome::Equal)
        }
        CheckOutcome::Diverged(divergence) => {
            warn!(
                delta = %divergence.delta_text(),
                delta_tokens = %divergence.delta_tokens_text(),
                "bridge invariant violated"
            );

            // Alert delivery must not gate the breaker.
            let alert = alert_text(cfg, &reading, &divergence);
            if let Err(e) = notifier.notify(AlertKind::Divergence, &alert).await {
                warn!(error = %e, "divergence alert failed, tripping regardless");
            }

            match breaker.trip(&divergence).await {
                Ok(tx_hash) => {
                    let receipt = receipt_text(cfg, tx_hash);
                    if let Err(e) = notifier.notify(AlertKind::TripReceipt, &receipt).await {
                        // The bridge was disarmed but nobody was told.
                        error!(
                            error = %e,
                            tx_hash = ?tx_hash,
                            "resetPeer confirmed but receipt notification failed"
                        );
                    }
                    Ok(TickOutcome::Tripped(tx_hash))
                }
                Err(e) => {
                    let failure = trip_failure_text(cfg, &e);
                    if let Err(n) = notifier.notify(AlertKind::TripFailure, &failure).await {
                        warn!(error = %n, "trip failure notification failed");
                    }
                    Err(TickFailure::new(TickPhase::Trip, e))
                }
            }
        }
    }
}

/// Wire up the live components and run one tick.
///
/// Secrets are resolved fresh on every invocation so key and token
/// rotations take effect at the next trigger.
pub async fn run_tick(
    cfg: &MonitorConfig,
    store: &dyn SecretStore,
) -> Result<TickOutcome, TickFailure> {
    let setup = |e: MonitorError| TickFailure::new(TickPhase::Setup, e);

    let home_url = gateway_url(&cfg.home_network).map_err(setup)?;
    let remote_url = gateway_url(&cfg.remote_network).map_err(setup)?;
    let home = EvmAdapter::connect(cfg.home_label(), &home_url).map_err(setup)?;
    let remote = EvmAdapter::connect(cfg.remote_label(), &remote_url).map_err(setup)?;

    let bot_token = store.get(&cfg.bot_token_secret).await.map_err(setup)?;
    let chat_id = store.get(&cfg.channel_id_secret).await.map_err(setup)?;
    let signing_key = store
        .get(&cfg.private_key_secret_name())
        .await
        .map_err(setup)?;

    let notifier = TelegramNotifier::new(bot_token, chat_id.to_string()).map_err(setup)?;
    let sampler = BalanceSampler::new(&home, &remote, cfg);
    let breaker = PeerBreaker::new(cfg, &home, &remote, signing_key).map_err(setup)?;

    run_state_machine(&sampler, &breaker, &notifier, cfg).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Divergence;
    use crate::errors::Result;
    use crate::types::Reading;
    use async_trait::async_trait;
    use ethers::types::{H256, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_config() -> MonitorConfig {
        serde_yaml::from_str(
            r#"
home_network: mainnet
remote_network: polygon
remote_label: Polygon
token_address: "0x541Ae71C06fbFAE89AcD99149dC95B0965971E37"
adapter_address: "0xD8Cd4fB967De89A10D1db89daC7D103EB22509EB"
oft_address: "0xa044Ee26D29CF2E8bE374AdF23fc90d528A9eC42"
breaker_side: remote
peer_chain_id: 1
label_prefix: "MOCA_POLY"
explorer_tx_url_template: "https://polygonscan.com/tx/%s"
"#,
        )
        .expect("test config parses")
    }

    struct FixedSampler(U256, U256);

    #[async_trait]
    impl Sampler for FixedSampler {
        async fn sample(&self) -> Result<Reading> {
            Ok(Reading::new(self.0, self.1))
        }
    }

    struct FailingSampler;

    #[async_trait]
    impl Sampler for FailingSampler {
        async fn sample(&self) -> Result<Reading> {
            Err(MonitorError::RpcTransport {
                chain: "polygon".to_string(),
                reason: "gateway unreachable".to_string(),
            })
        }
    }

    struct CountingBreaker {
        trips: AtomicUsize,
        fail: bool,
    }

    impl CountingBreaker {
        fn new(fail: bool) -> Self {
            Self {
                trips: AtomicUsize::new(0),
                fail,
            }
        }

        fn trip_count(&self) -> usize {
            self.trips.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Breaker for CountingBreaker {
        async fn trip(&self, _divergence: &Divergence) -> Result<H256> {
            self.trips.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(MonitorError::BroadcastRejected {
                    chain: "Polygon".to_string(),
                    reason: "nonce too low".to_string(),
                })
            } else {
                Ok(H256::repeat_byte(0x42))
            }
        }
    }

    struct RecordingNotifier {
        sent: Mutex<Vec<(AlertKind, String)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn kinds(&self) -> Vec<AlertKind> {
            self.sent.lock().unwrap().iter().map(|(k, _)| *k).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, kind: AlertKind, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push((kind, text.to_string()));
            if self.fail {
                Err(MonitorError::NotifierFailure("HTTP 502".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[tokio::test]
    async fn test_healthy_tick_broadcasts_nothing() {
        let cfg = test_config();
        let sampler = FixedSampler(tokens(1_000_000), tokens(1_000_000));
        let breaker = CountingBreaker::new(false);
        let notifier = RecordingNotifier::new(false);

        let outcome = run_state_machine(&sampler, &breaker, &notifier, &cfg)
            .await
            .expect("healthy tick");

        assert_eq!(outcome, TickOutcome::Equal);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(breaker.trip_count(), 0);
        assert_eq!(notifier.kinds(), vec![AlertKind::Healthy]);
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].1.contains("Balances are equal"));
    }

    #[tokio::test]
    async fn test_divergent_tick_trips_exactly_once() {
        let cfg = test_config();
        let sampler = FixedSampler(tokens(1_000_000), tokens(999_999));
        let breaker = CountingBreaker::new(false);
        let notifier = RecordingNotifier::new(false);

        let outcome = run_state_machine(&sampler, &breaker, &notifier, &cfg)
            .await
            .expect("tripped tick");

        assert_eq!(outcome, TickOutcome::Tripped(H256::repeat_byte(0x42)));
        assert_eq!(outcome.exit_code(), 10);
        assert_eq!(breaker.trip_count(), 1);
        // Alert is observable before the receipt, receipt after the trip.
        assert_eq!(
            notifier.kinds(),
            vec![AlertKind::Divergence, AlertKind::TripReceipt]
        );
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].1.contains("Delta: 1000000000000000000"));
        assert!(sent[0].1.contains("DeltaTokens: 1"));
        assert!(sent[1].1.contains("https://polygonscan.com/tx/0x"));
    }

    #[tokio::test]
    async fn test_negative_drift_still_trips() {
        let cfg = test_config();
        let sampler = FixedSampler(U256::zero(), tokens(5));
        let breaker = CountingBreaker::new(false);
        let notifier = RecordingNotifier::new(false);

        let outcome = run_state_machine(&sampler, &breaker, &notifier, &cfg)
            .await
            .expect("tripped tick");

        assert_eq!(outcome.exit_code(), 10);
        assert_eq!(breaker.trip_count(), 1);
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].1.contains("Delta: -5000000000000000000"));
    }

    #[tokio::test]
    async fn test_sampler_failure_has_no_side_effects() {
        let cfg = test_config();
        let breaker = CountingBreaker::new(false);
        let notifier = RecordingNotifier::new(false);

        let failure = run_state_machine(&FailingSampler, &breaker, &notifier, &cfg)
            .await
            .unwrap_err();

        assert_eq!(failure.phase, TickPhase::Sample);
        assert_eq!(failure.exit_code(), 20);
        assert_eq!(breaker.trip_count(), 0);
        assert!(notifier.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_suppress_trip() {
        let cfg = test_config();
        let sampler = FixedSampler(tokens(1), U256::zero());
        let breaker = CountingBreaker::new(false);
        let notifier = RecordingNotifier::new(true);

        let outcome = run_state_machine(&sampler, &breaker, &notifier, &cfg)
            .await
            .expect("tick still done");

        assert_eq!(outcome.exit_code(), 10);
        assert_eq!(breaker.trip_count(), 1);
        // Both the alert and the receipt were still attempted.
        assert_eq!(
            notifier.kinds(),
            vec![AlertKind::Divergence, AlertKind::TripReceipt]
        );
    }

    #[tokio::test]
    async fn test_trip_failure_posts_failure_notification() {
        let cfg = test_config();
        let sampler = FixedSampler(tokens(1_000_000), tokens(999_999));
        let breaker = CountingBreaker::new(true);
        let notifier = RecordingNotifier::new(false);

        let failure = run_state_machine(&sampler, &breaker, &notifier, &cfg)
            .await
            .unwrap_err();

        assert_eq!(failure.phase, TickPhase::Trip);
        assert_eq!(failure.exit_code(), 21);
        assert_eq!(breaker.trip_count(), 1);
        assert_eq!(
            notifier.kinds(),
            vec![AlertKind::Divergence, AlertKind::TripFailure]
        );
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[1].1.contains("nonce too low"));
    }
}
