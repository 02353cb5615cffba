//! Configuration module for the bridge monitor
//!
//! One deployment of the monitor watches exactly one (home, remote)
//! chain pair. The four original deployment variants differ only in
//! contract addresses, breaker side, peer chain id and alert label,
//! so all of that is configuration here rather than separate builds.

use std::fs;
use std::path::Path;

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{MonitorError, Result};
use crate::types::BreakerSide;

/// Default secret names, matching the namespace the host vault uses.
fn default_private_key_secret() -> String {
    "monitor.privateKey".to_string()
}

fn default_bot_token_secret() -> String {
    "MocaMonitorBotToken".to_string()
}

fn default_channel_id_secret() -> String {
    "telegram.channelId".to_string()
}

/// Immutable per-process deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Host gateway selector name for the home chain (e.g. "mainnet").
    pub home_network: String,

    /// Host gateway selector name for the remote chain (e.g. "polygon").
    pub remote_network: String,

    /// Human label for the home chain, used in alerts and logs.
    #[serde(default)]
    pub home_label: Option<String>,

    /// Human label for the remote chain.
    #[serde(default)]
    pub remote_label: Option<String>,

    /// Canonical token contract on the home chain.
    pub token_address: Address,

    /// Adapter contract custodying the locked supply on the home chain.
    pub adapter_address: Address,

    /// Mirror OFT contract on the remote chain.
    pub oft_address: Address,

    /// Which side `resetPeer` is invoked on when divergence is detected.
    pub breaker_side: BreakerSide,

    /// Numeric identifier passed to `resetPeer`. The identifier space
    /// (EVM chain id vs. messaging endpoint id) depends on the target
    /// contract, so this field is required and has no default.
    pub peer_chain_id: u32,

    /// Free text inserted at the top of every alert.
    pub label_prefix: String,

    /// printf-style URL template for the receipt message; `%s` receives
    /// the transaction hash.
    pub explorer_tx_url_template: String,

    /// Use the production (`.Live`) private-key secret.
    #[serde(default)]
    pub live: bool,

    /// Secret name for the monitor signing key (without the `.Live`
    /// suffix; see [`MonitorConfig::private_key_secret_name`]).
    #[serde(default = "default_private_key_secret")]
    pub private_key_secret: String,

    /// Secret name for the Telegram bot token.
    #[serde(default = "default_bot_token_secret")]
    pub bot_token_secret: String,

    /// Secret name for the Telegram channel id.
    #[serde(default = "default_channel_id_secret")]
    pub channel_id_secret: String,
}

impl MonitorConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        let content = fs::read_to_string(path).map_err(|e| {
            MonitorError::ConfigMissing(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: MonitorConfig = serde_yaml::from_str(&content).map_err(|e| {
            MonitorError::ConfigMissing(format!("cannot parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Reject configurations that would only fail later in the tick.
    pub fn validate(&self) -> Result<()> {
        if self.home_network.is_empty() || self.remote_network.is_empty() {
            return Err(MonitorError::ConfigMissing(
                "home_network and remote_network must be set".to_string(),
            ));
        }
        if !self.explorer_tx_url_template.contains("%s") {
            return Err(MonitorError::ConfigMissing(
                "explorer_tx_url_template must contain a %s placeholder".to_string(),
            ));
        }
        if self.label_prefix.is_empty() {
            return Err(MonitorError::ConfigMissing(
                "label_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Label for the home chain, falling back to the gateway name.
    pub fn home_label(&self) -> &str {
        self.home_label.as_deref().unwrap_or(&self.home_network)
    }

    /// Label for the remote chain, falling back to the gateway name.
    pub fn remote_label(&self) -> &str {
        self.remote_label.as_deref().unwrap_or(&self.remote_network)
    }

    /// Label of the chain the breaker acts on.
    pub fn breaker_label(&self) -> &str {
        match self.breaker_side {
            BreakerSide::Home => self.home_label(),
            BreakerSide::Remote => self.remote_label(),
        }
    }

    /// Contract the `resetPeer` call targets: the Adapter when breaking
    /// from home, the OFT when breaking from remote.
    pub fn breaker_target(&self) -> Address {
        match self.breaker_side {
            BreakerSide::Home => self.adapter_address,
            BreakerSide::Remote => self.oft_address,
        }
    }

    /// Full secret name for the signing key, honoring the `live` flag.
    pub fn private_key_secret_name(&self) -> String {
        if self.live {
            format!("{}.Live", self.private_key_secret)
        } else {
            self.private_key_secret.clone()
        }
    }

    /// Render the explorer URL for a confirmed transaction.
    pub fn explorer_url(&self, tx_hash: H256) -> String {
        self.explorer_tx_url_template
            .replacen("%s", &format!("{:?}", tx_hash), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
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
"#;

    fn sample_config() -> MonitorConfig {
        serde_yaml::from_str(SAMPLE_YAML).expect("sample config parses")
    }

    #[test]
    fn test_parse_sample() {
        let cfg = sample_config();
        assert_eq!(cfg.breaker_side, BreakerSide::Remote);
        assert_eq!(cfg.peer_chain_id, 1);
        assert_eq!(cfg.home_label(), "mainnet");
        assert_eq!(cfg.remote_label(), "Polygon");
        assert_eq!(cfg.breaker_label(), "Polygon");
        assert_eq!(cfg.breaker_target(), cfg.oft_address);
        assert!(!cfg.live);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_home_breaker_targets_adapter() {
        let mut cfg = sample_config();
        cfg.breaker_side = BreakerSide::Home;
        assert_eq!(cfg.breaker_target(), cfg.adapter_address);
        assert_eq!(cfg.breaker_label(), "mainnet");
    }

    #[test]
    fn test_peer_chain_id_is_required() {
        let yaml = SAMPLE_YAML.replace("peer_chain_id: 1\n", "");
        let parsed: std::result::Result<MonitorConfig, _> = serde_yaml::from_str(&yaml);
        assert!(parsed.is_err(), "peer_chain_id must not default");
    }

    #[test]
    fn test_explorer_template_must_have_placeholder() {
        let mut cfg = sample_config();
        cfg.explorer_tx_url_template = "https://polygonscan.com/tx/".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_explorer_url_renders_full_hash() {
        let cfg = sample_config();
        let url = cfg.explorer_url(H256::repeat_byte(0xab));
        assert_eq!(
            url,
            format!("https://polygonscan.com/tx/0x{}", "ab".repeat(32))
        );
    }

    #[test]
    fn test_live_secret_suffix() {
        let mut cfg = sample_config();
        assert_eq!(cfg.private_key_secret_name(), "monitor.privateKey");
        cfg.live = true;
        assert_eq!(cfg.private_key_secret_name(), "monitor.privateKey.Live");
    }
}
