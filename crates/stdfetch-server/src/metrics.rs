//! Prometheus metrics collection and formatting.
//!
//! Task counts are exposed in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::Arc;

use crate::state::AppState;

/// Collect all metrics from AppState and format as Prometheus text.
pub async fn collect_metrics(state: &Arc<AppState>) -> String {
    let mut output = String::new();
    collect_task_metrics(state, &mut output).await;
    output
}

/// Collect task metrics by status.
async fn collect_task_metrics(state: &Arc<AppState>, output: &mut String) {
    let counts = state.service.store().status_counts().await;

    writeln!(
        output,
        "# HELP stdfetch_tasks_total Number of tracked tasks by status"
    )
    .ok();
    writeln!(output, "# TYPE stdfetch_tasks_total gauge").ok();
    for (status, count) in counts {
        writeln!(output, "stdfetch_tasks_total{{status=\"{status}\"}} {count}").ok();
    }
}
