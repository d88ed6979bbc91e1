//! Per-client counters for authentication attempts

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters, one per terminal state of an attempt
#[derive(Debug, Default)]
pub struct ClientStats {
    attempts: AtomicU64,
    accepts: AtomicU64,
    rejects: AtomicU64,
    timeouts: AtomicU64,
    transport_errors: AtomicU64,
    invalid_responses: AtomicU64,
    encode_errors: AtomicU64,
}

/// Point-in-time copy of [`ClientStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    pub attempts: u64,
    pub accepts: u64,
    pub rejects: u64,
    pub timeouts: u64,
    pub transport_errors: u64,
    pub invalid_responses: u64,
    pub encode_errors: u64,
}

impl StatsSnapshot {
    /// Attempts that reached a terminal state
    pub fn completed(&self) -> u64 {
        self.accepts
            + self.rejects
            + self.timeouts
            + self.transport_errors
            + self.invalid_responses
            + self.encode_errors
    }
}

impl ClientStats {
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.accepts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reject(&self) {
        self.rejects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_response(&self) {
        self.invalid_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            accepts: self.accepts.load(Ordering::Relaxed),
            rejects: self.rejects.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            invalid_responses: self.invalid_responses.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = ClientStats::default();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());

        stats.record_attempt();
        stats.record_accept();
        stats.record_attempt();
        stats.record_timeout();
        stats.record_attempt();
        stats.record_invalid_response();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.accepts, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.invalid_responses, 1);
        assert_eq!(snapshot.completed(), snapshot.attempts);
    }
}
