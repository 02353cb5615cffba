//! Secret resolution
//!
//! The host vends secrets and gateway URLs as environment key/value
//! pairs. Secrets are fetched once per tick and never cached across
//! ticks, so a rotation takes effect on the next scheduler trigger.
//! Resolved values are wrapped in [`Zeroizing`] so key material is
//! wiped when the tick drops it; nothing here is ever logged.
//!
//! Dotted vault names map onto environment keys by uppercasing and
//! replacing separators: `monitor.privateKey.Live` becomes
//! `MONITOR_PRIVATEKEY_LIVE`, gateway selector `polygon` becomes
//! `GATEWAY_URL_POLYGON`.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::errors::{MonitorError, Result};

/// Read-only access to host-vended secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret by its vault name. Absence is fatal for the tick.
    async fn get(&self, name: &str) -> Result<Zeroizing<String>>;
}

/// Map a dotted vault name onto an environment key.
pub fn env_key(name: &str) -> String {
    name.replace(['.', '-'], "_").to_uppercase()
}

/// Resolve the gateway URL for a host gateway selector name.
pub fn gateway_url(network: &str) -> Result<String> {
    let key = format!("GATEWAY_URL_{}", env_key(network));
    std::env::var(&key).map_err(|_| {
        MonitorError::ConfigMissing(format!("no gateway configured for network '{}'", network))
    })
}

/// Secret store backed by the process environment.
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, name: &str) -> Result<Zeroizing<String>> {
        match std::env::var(env_key(name)) {
            Ok(value) if !value.is_empty() => Ok(Zeroizing::new(value)),
            _ => Err(MonitorError::SecretMissing(name.to_string())),
        }
    }
}
