//! Throttle domain
//!
//! Request budgets are tracked per `(api key, route)` pair in fixed windows.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::api_key::ApiKeyId;
use crate::domain::guard::RouteId;

/// Identifies one throttle window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub api_key_id: ApiKeyId,
    pub route: RouteId,
}

impl ThrottleKey {
    pub fn new(api_key_id: ApiKeyId, route: RouteId) -> Self {
        Self { api_key_id, route }
    }
}

impl std::fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.api_key_id, self.route)
    }
}

/// Limit and window length declared by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottlePolicy {
    pub limit: u32,
    pub ttl_secs: u64,
}

impl ThrottlePolicy {
    /// 150 requests per minute
    pub const DEFAULT: Self = Self::new(150, 60);
    /// 700 requests per minute, for bulk reads and hot update paths
    pub const BULK: Self = Self::new(700, 60);

    pub const fn new(limit: u32, ttl_secs: u64) -> Self {
        Self { limit, ttl_secs }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Budget left after an admitted call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrottleStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_in_secs: u64,
}
