//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Count a failed query.
pub fn record_query_error(query_name: &str) {
    counter!(
        "database_query_errors_total",
        "query" => query_name.to_string()
    )
    .increment(1);
}

/// Record database connection pool metrics.
///
/// Call this function periodically to track pool health.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a single query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_preference_by_user_and_entity");
/// let result = sqlx::query_as::<_, PreferenceEntity>(...).fetch_optional(&pool).await;
/// timer.finish(result)
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

    pub fn query_name(&self) -> &'static str {
        self.query_name
    }

    /// Record the elapsed duration.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }

    /// Record the elapsed duration, count an error if the query failed, and
    /// hand the result back.
    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            record_query_error(self.query_name);
        }
        self.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("upsert_preference");
        assert_eq!(timer.query_name(), "upsert_preference");
    }

    #[test]
    fn test_finish_passes_result_through() {
        let ok: Result<i64, String> = QueryTimer::new("q").finish(Ok(5));
        assert_eq!(ok, Ok(5));

        let err: Result<i64, String> = QueryTimer::new("q").finish(Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));
    }
}
