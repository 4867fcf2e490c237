//! The meeting provider: orchestrates one fetch–parse–serialize–publish
//! cycle and exposes the host-facing configuration surface.
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::feed::{fetch_feed, parse_feed, query_url, query_window, render_feed};
use crate::feed::{FetchError, ParseError, SerializeError};
use crate::publish::{
    ContextPayload, PublishError, Publisher, INFORMATION_MEETING_FEED, PAYLOAD_FIELD_FEED,
    PAYLOAD_OBJECT_MEETING,
};
use crate::settings::{ProviderSettings, SettingsError, SETTING_REFRESH_INTERVAL, SETTING_SET_AUTH};

/// Information names this provider advertises to the host.
pub const INFORMATION_PROVIDED: &[&str] = &[INFORMATION_MEETING_FEED];

/// Configuration settings this provider accepts.
pub const CONFIGURATIONS_SUPPORTED: &[&str] = &[SETTING_SET_AUTH, SETTING_REFRESH_INTERVAL];

/// A failure inside one refresh cycle. Always absorbed by the cycle: logged,
/// batch discarded, next cycle unaffected.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Outcome of one refresh cycle. Never fatal — whatever happened, the
/// scheduler reschedules.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No auth token is set; the fetch was skipped entirely.
    AwaitingAuth,
    /// The feed was fetched, normalized, and published.
    Published { events: usize },
    /// The cycle failed; the batch was discarded.
    Failed(CycleError),
}

/// Periodic calendar-to-context-feed adapter.
pub struct MeetingProvider {
    feed_url: Url,
    client: reqwest::Client,
    settings: ProviderSettings,
    publisher: Publisher,
}

impl MeetingProvider {
    pub fn new(
        feed_url: Url,
        client: reqwest::Client,
        settings: ProviderSettings,
        publisher: Publisher,
    ) -> Self {
        Self {
            feed_url,
            client,
            settings,
            publisher,
        }
    }

    /// The shared settings cell, for the scheduler and the host.
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Host-facing configuration dispatch. The one error class that
    /// propagates synchronously to the caller.
    pub fn set_configuration(&self, name: &str, value: &str) -> Result<(), SettingsError> {
        self.settings.apply(name, value)
    }

    /// Run one refresh cycle to completion.
    ///
    /// If no auth token is set the fetch is skipped for this cycle. Any
    /// failure is logged and absorbed here; nothing reaches the publish sink
    /// on failure and nothing is fatal to the process.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(token) = self.settings.auth_token() else {
            tracing::debug!("No auth token configured, skipping fetch this cycle");
            return CycleOutcome::AwaitingAuth;
        };

        match self.try_cycle(&token).await {
            Ok(events) => {
                tracing::info!(events, "Published meeting feed");
                CycleOutcome::Published { events }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh cycle failed, will retry at next interval");
                CycleOutcome::Failed(e)
            }
        }
    }

    async fn try_cycle(&self, token: &SecretString) -> Result<usize, CycleError> {
        let window = query_window(chrono::Local::now().naive_local());
        let url = query_url(&self.feed_url, &window);

        let body = fetch_feed(&self.client, url, token).await?;
        let events = parse_feed(&body)?;
        let document = render_feed(&events)?;

        let mut payload = ContextPayload::new(PAYLOAD_OBJECT_MEETING);
        payload.push_value(PAYLOAD_FIELD_FEED, document);
        self.publisher.publish(payload).await?;

        Ok(events.len())
    }
}
