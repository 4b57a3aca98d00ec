//! Database metrics collection.
//!
//! Provides functions for recording database and feed metrics.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record roster query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "roster_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Count one event received from the status feed, by kind.
pub fn record_feed_event(kind: &'static str) {
    counter!("roster_feed_events_total", "kind" => kind).increment(1);
}

/// Record database connection pool metrics.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a query and records its duration when dropped via [`record`](Self::record).
///
/// ```ignore
/// let timer = QueryTimer::new("find_groups_owned_by");
/// let result = sqlx::query_as::<_, GroupEntity>(...).fetch_all(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("find_groups_owned_by");
        assert_eq!(timer.query_name, "find_groups_owned_by");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        QueryTimer::new("find_members_by_groups").record();
        record_feed_event("insert");
    }
}
