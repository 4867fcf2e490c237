//! Shared runtime settings for the meeting provider.
//!
//! The host mutates these through the string-keyed configuration surface
//! (`setAuth`, `refreshInterval`) while the background refresh cycle reads
//! them, so the cell is lock-guarded. The lock is a `std::sync::RwLock`
//! because no guard is ever held across an `.await`.
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::config::Config;

/// Configuration key that sets the calendar auth token.
pub const SETTING_SET_AUTH: &str = "setAuth";

/// Configuration key that sets the refresh interval (integer seconds).
pub const SETTING_REFRESH_INTERVAL: &str = "refreshInterval";

/// Default refresh interval: 15 minutes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(900_000);

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced synchronously to the configuring caller.
///
/// Unlike cycle-time failures these are caller-supplied-value errors, so they
/// propagate instead of being absorbed.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("refreshInterval must be a positive integer number of seconds, got {0:?}")]
    InvalidInterval(String),

    #[error("Unsupported configuration setting: {0:?}")]
    UnknownSetting(String),
}

// ============================================================================
// ProviderSettings
// ============================================================================

struct Inner {
    auth_token: Option<SecretString>,
    refresh_interval: Duration,
}

/// Shared mutable provider settings.
///
/// `Clone` shares the underlying cell, so a handle given to the host's
/// configuration surface and the handle read by the scheduler observe the
/// same state.
#[derive(Clone)]
pub struct ProviderSettings {
    inner: Arc<RwLock<Inner>>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                auth_token: None,
                refresh_interval: DEFAULT_REFRESH_INTERVAL,
            })),
        }
    }
}

impl ProviderSettings {
    /// Create settings with no token and the default 15-minute interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed settings from the startup config file (and env var override).
    pub fn from_config(config: &Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                auth_token: config.resolve_auth_token().map(SecretString::from),
                refresh_interval: Duration::from_secs(config.refresh_interval_secs.max(1)),
            })),
        }
    }

    /// Apply a named configuration value.
    ///
    /// - `setAuth` stores the value verbatim as the auth token.
    /// - `refreshInterval` parses the value as integer seconds; the stored
    ///   interval becomes value × 1000 ms. Non-numeric or zero values are
    ///   rejected and the previous interval is retained.
    pub fn apply(&self, name: &str, value: &str) -> Result<(), SettingsError> {
        match name {
            SETTING_SET_AUTH => {
                tracing::debug!("Auth token updated");
                self.write().auth_token = Some(SecretString::from(value.to_string()));
                Ok(())
            }
            SETTING_REFRESH_INTERVAL => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| SettingsError::InvalidInterval(value.to_string()))?;
                if secs == 0 {
                    // A zero interval is a busy-loop
                    return Err(SettingsError::InvalidInterval(value.to_string()));
                }
                tracing::debug!(interval_secs = secs, "Refresh interval updated");
                self.write().refresh_interval = Duration::from_millis(secs.saturating_mul(1000));
                Ok(())
            }
            other => Err(SettingsError::UnknownSetting(other.to_string())),
        }
    }

    /// Snapshot of the auth token, if one has been set.
    pub fn auth_token(&self) -> Option<SecretString> {
        self.read().auth_token.clone()
    }

    /// Current refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        self.read().refresh_interval
    }

    // A panic while holding the lock still leaves the Inner data coherent
    // (both fields are written atomically under the guard), so recover from
    // poisoning instead of propagating the panic.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tests
// ============================================================================
