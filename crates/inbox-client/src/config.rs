//! Client configuration

use inbox_core::UserId;
use std::time::Duration;

/// Reconnect schedule of the event stream
///
/// Fast retries back off geometrically from `base_delay` up to `max_delay`.
/// After `max_attempts` fast retries the next one waits `slow_delay` and the
/// count starts over. An open stream that delivers nothing for
/// `idle_timeout` counts as failed; the gateway heartbeats well inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub slow_delay: Duration,
    pub idle_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            factor: 1.5,
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
            slow_delay: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ReconnectPolicy {
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn slow_delay(mut self, delay: Duration) -> Self {
        self.slow_delay = delay;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Delay before fast retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Connection settings for one logged-in user
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway root, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    /// Bearer session token
    pub token: String,
    pub user_id: UserId,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            user_id: user_id.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Absolute URL of an `/api/v1` path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}
