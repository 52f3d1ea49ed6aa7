//! OTP checkpoint policy.
//!
//! Code generation and the bypass rule live here; storage and matching live in the SQLite
//! backend. The backend never decides whether a bypass is allowed, it is told via [`OtpCheck`].

use chrono::Duration;
use rand::Rng;

/// The operator override accepted at every checkpoint when the bypass flag is enabled.
pub const OTP_BYPASS_CODE: &str = "0000";

pub const DEFAULT_OTP_TTL_SECONDS: i64 = 300;

/// Generates a four-digit checkpoint code, 1000 to 9999 inclusive.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..10_000).to_string()
}

/// Runtime OTP policy, wired from server configuration.
#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    /// Codes older than this are invalid even if still present in the store.
    pub ttl: Duration,
    /// Whether the "0000" operator override is honored. Off unless explicitly enabled.
    pub allow_bypass: bool,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self { ttl: Duration::seconds(DEFAULT_OTP_TTL_SECONDS), allow_bypass: false }
    }
}

impl OtpSettings {
    /// Classifies a submitted code under this policy.
    pub fn check_for(&self, code: &str) -> OtpCheck {
        if self.allow_bypass && code == OTP_BYPASS_CODE {
            OtpCheck::Bypass
        } else {
            OtpCheck::Code(code.to_string())
        }
    }
}

/// A submitted code after policy classification. `Bypass` skips the store lookup entirely and
/// performs the identical state mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpCheck {
    Bypass,
    Code(String),
}
