//! Per-user send quota
//!
//! A fixed window anchored at the first call after the previous window
//! expired. Both backends run [`RateLimitCounter::register`] under a lock so
//! check-and-increment is a single step.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Snowflake;

/// Rate-limited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitAction {
    SendMessage,
    #[serde(rename = "direct_message")]
    SendDirectMessage,
}

impl RateLimitAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
            Self::SendDirectMessage => "direct_message",
        }
    }
}

impl fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota: `max_requests` per `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const DEFAULT_MAX_REQUESTS: u32 = 30;
    pub const DEFAULT_WINDOW_SECS: i64 = 60;

    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_REQUESTS,
            Duration::seconds(Self::DEFAULT_WINDOW_SECS),
        )
    }
}

/// Outcome of registering one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Counter row, one per `(user_id, action)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitCounter {
    pub user_id: Snowflake,
    pub action: RateLimitAction,
    pub count: i32,
    pub window_start: DateTime<Utc>,
}

impl RateLimitCounter {
    /// Counter for a first-ever call; counts that call
    pub fn first(user_id: Snowflake, action: RateLimitAction, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            action,
            count: 1,
            window_start: now,
        }
    }

    /// Count one call at `now`, returning whether it may proceed
    ///
    /// A limited call does not change the counter.
    pub fn register(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> RateLimitDecision {
        let max = i64::from(policy.max_requests);

        if now - self.window_start >= policy.window {
            self.window_start = now;
            self.count = 1;
        } else if i64::from(self.count) >= max {
            return RateLimitDecision::Limited {
                retry_after: self.window_start + policy.window - now,
            };
        } else {
            self.count += 1;
        }

        RateLimitDecision::Allowed {
            remaining: (max - i64::from(self.count)).max(0) as u32,
        }
    }
}
