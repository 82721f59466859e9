//! Reconnection controller
//!
//! Pure state machine for the event stream's connection phase. It performs no
//! I/O and owns no timer; the subscriber asks it for the next delay and
//! sleeps on its behalf.

use crate::config::ReconnectPolicy;
use std::fmt;
use std::time::Duration;

/// Phase of the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        })
    }
}

/// Snapshot reported to status listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub phase: ConnectionPhase,
    /// Fast retries used since the last successful connection or slow retry
    pub attempts: u32,
    /// Set once the fast retry budget ran out, cleared on the next connection
    pub degraded: bool,
}

/// Tracks phase, attempt count and the degraded flag
#[derive(Debug, Clone)]
pub struct ReconnectionController {
    policy: ReconnectPolicy,
    phase: ConnectionPhase,
    attempts: u32,
    degraded: bool,
}

impl ReconnectionController {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            phase: ConnectionPhase::Disconnected,
            attempts: 0,
            degraded: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            phase: self.phase,
            attempts: self.attempts,
            degraded: self.degraded,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// A connect attempt starts
    pub fn on_connecting(&mut self) -> ConnectionStatus {
        self.phase = ConnectionPhase::Connecting;
        self.status()
    }

    /// The stream opened
    pub fn on_connected(&mut self) -> ConnectionStatus {
        self.phase = ConnectionPhase::Connected;
        self.attempts = 0;
        self.degraded = false;
        self.status()
    }

    /// The stream failed or could not be opened; returns the delay before the
    /// next attempt
    ///
    /// Within the fast budget the attempt count grows by one and the delay
    /// backs off. Once the budget is spent the next attempt is scheduled after
    /// the slow delay, the count resets and the session is flagged degraded.
    pub fn on_failure(&mut self) -> Duration {
        self.phase = ConnectionPhase::Reconnecting;

        if self.attempts >= self.policy.max_attempts {
            self.attempts = 0;
            self.degraded = true;
            return self.policy.slow_delay;
        }

        self.attempts += 1;
        self.policy.delay_for(self.attempts)
    }

    /// Deliberate close; no reconnect follows
    pub fn on_closed(&mut self) -> ConnectionStatus {
        self.phase = ConnectionPhase::Disconnected;
        self.attempts = 0;
        self.status()
    }
}

impl Default for ReconnectionController {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
