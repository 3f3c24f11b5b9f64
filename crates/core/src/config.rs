use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Worker config ─────────────────────────────────────────────

/// Process-level settings for the polling worker.
///
/// Profile is read from `ESSCALE_PROFILE`. When set (e.g. `PROD`), every key
/// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Path to the TOML trigger definition.
    pub trigger_file: PathBuf,
    /// Seconds between polls.
    pub poll_interval_secs: u64,
    /// Deadline for each round trip to the search engine.
    pub http_timeout_ms: u64,
}

impl WorkerConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        let profile = env_opt("ESSCALE_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            trigger_file: PathBuf::from(profiled_env_or(
                p,
                "SCALER_TRIGGER_FILE",
                "config/trigger.toml",
            )),
            poll_interval_secs: profiled_env_u64(p, "SCALER_POLL_INTERVAL_SECS", 30),
            http_timeout_ms: profiled_env_u64(p, "SCALER_HTTP_TIMEOUT_MS", 3000),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            profile = %self.profile_label(),
            trigger_file = %self.trigger_file.display(),
            poll_interval_secs = self.poll_interval_secs,
            http_timeout_ms = self.http_timeout_ms,
            "worker config loaded"
        );
    }
}
