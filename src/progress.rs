//! Progress reporting for long-running stages
//!
//! Both the crawl engine and the analyzer accept an optional callback so a
//! caller (a polling UI, a CLI spinner) can observe progress. The callback is
//! informational only; correctness never depends on it being present.

use std::sync::Arc;

/// Progress callback: `(percent_complete in [0, 100], message)`
pub type ProgressFn = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// Invokes the callback if one is installed
pub fn report(progress: Option<&ProgressFn>, percent: f32, message: &str) {
    if let Some(callback) = progress {
        callback(percent.clamp(0.0, 100.0), message);
    }
}
