use std::time::Instant;

use super::StatsdSink;

/// Records elapsed wall time as a `ms` metric when the scope exits.
///
/// ```ignore
/// let _timer = sink.timer("database.query_time");
/// run_query().await?;
/// // drop emits database.query_time:<elapsed>|ms
/// ```
pub struct ScopedTimer {
    sink: StatsdSink,
    metric: &'static str,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(
        sink: StatsdSink,
        metric: &'static str,
    ) -> Self {
        Self {
            sink,
            metric,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_millis() as i64;
        self.sink.timing(self.metric, elapsed, 1.0);
    }
}
