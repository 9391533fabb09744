//! `/health` endpoint.

use std::time::Instant;

use serde::Serialize;

/// Health check response body.
#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Current WebSocket connection count.
    pub connections: usize,
    /// Number of live interview sessions.
    pub active_sessions: usize,
}

/// Build a health response from live counters.
#[must_use]
pub fn health_check(start_time: Instant, connections: usize, sessions: usize) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
        active_sessions: sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0, 0);
        assert_eq!(resp.status, "ok");
    }

    #[test]
    fn counters_are_carried_through() {
        let resp = health_check(Instant::now(), 4, 2);
        assert_eq!(resp.connections, 4);
        assert_eq!(resp.active_sessions, 2);
    }

    #[test]
    fn uptime_reflects_start_time() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(120))
            .unwrap();
        let resp = health_check(start, 0, 0);
        assert!(resp.uptime_secs >= 119);
    }

    #[test]
    fn serializes_snake_case_fields() {
        let resp = health_check(Instant::now(), 1, 1);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].is_number());
        assert_eq!(json["connections"], 1);
        assert_eq!(json["active_sessions"], 1);
    }
}
