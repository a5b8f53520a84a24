/// Deadline presets for the calls a service makes while serving a request
use std::time::Duration;

/// Per-call-class deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// Register / login round trips to the identity service
    pub rpc: Duration,
    /// Refresh, logout and user-info lookups
    pub short_rpc: Duration,
    /// Course-membership checks made by capability guards
    pub authz_check: Duration,
    /// Forwarding to downstream HTTP services
    pub upstream: Duration,
    /// Single credential or refresh-token store round trip
    pub store: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            rpc: Duration::from_secs(3),
            short_rpc: Duration::from_secs(1),
            authz_check: Duration::from_secs(1),
            upstream: Duration::from_secs(10),
            store: Duration::from_secs(2),
        }
    }
}

impl Deadlines {
    /// Deadline for gRPC connection establishment; never longer than the
    /// longest per-call deadline.
    pub fn connect(&self) -> Duration {
        self.rpc.max(self.short_rpc).min(Duration::from_secs(5))
    }
}
