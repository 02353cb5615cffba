//! Invariant checker
//!
//! Pure comparison of the two sampled `uint256` values. Equality is
//! exact; there is no tolerance band. The delta keeps its sign in both
//! directions (adapter-greater is the expected exploit shape, but the
//! opposite is equally alerting) and is carried as sign + magnitude so
//! the full signed 257-bit range fits without floating point.

use ethers::types::U256;

use crate::types::Reading;

/// Result of checking one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Adapter balance and OFT supply match exactly.
    Equal,
    /// The bridge invariant is violated.
    Diverged(Divergence),
}

/// Signed difference `adapter_balance - oft_supply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// Absolute value of the delta, in base token units.
    pub magnitude: U256,
    /// True when the OFT supply exceeds the adapter balance.
    pub negative: bool,
}

impl Divergence {
    /// Exact signed decimal rendering of the delta in base units.
    pub fn delta_text(&self) -> String {
        if self.negative {
            format!("-{}", self.magnitude)
        } else {
            self.magnitude.to_string()
        }
    }

    /// Exact decimal rendering of `delta / 10^18` in whole tokens.
    ///
    /// Up to 18 fractional digits, trailing zeros trimmed, fraction
    /// omitted when zero. This is a display projection only; no
    /// arithmetic is ever performed on it.
    pub fn delta_tokens_text(&self) -> String {
        let one_token = U256::exp10(18);
        let whole = self.magnitude / one_token;
        let frac = self.magnitude % one_token;

        let mut text = String::new();
        if self.negative {
            text.push('-');
        }
        text.push_str(&whole.to_string());
        if !frac.is_zero() {
            let digits = format!("{:0>18}", frac);
            text.push('.');
            text.push_str(digits.trim_end_matches('0'));
        }
        text
    }
}

/// Compare a reading against the bridge invariant.
pub fn check(reading: &Reading) -> CheckOutcome {
    if reading.adapter_balance == reading.oft_supply {
        return CheckOutcome::Equal;
    }

    let divergence = if reading.adapter_balance >= reading.oft_supply {
        Divergence {
            magnitude: reading.adapter_balance - reading.oft_supply,
            negative: false,
        }
    } else {
        Divergence {
            magnitude: reading.oft_supply - reading.adapter_balance,
            negative: true,
        }
    };
    CheckOutcome::Diverged(divergence)
}
