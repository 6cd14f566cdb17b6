//! Periodic catch-up sweep, independent of user traffic.
//!
//! The fire-and-forget triggers give no delivery guarantee if the process
//! exits mid-task; this loop makes summarization at-least-once. The first
//! tick fires immediately, so pending work from a previous run is drained at
//! process start.

use crate::pipeline::SummarizationPipeline;

/// Spawn the background sweep loop. Every error is logged and the loop keeps
/// going; the handle is returned so hosts can abort on shutdown.
pub fn start_catchup_sweeper(
    pipeline: SummarizationPipeline,
    interval: std::time::Duration,
    limit: usize,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match pipeline.process_pending(limit).await {
                Ok(report) if report.summarized > 0 || report.failed > 0 => {
                    tracing::info!(
                        summarized = report.summarized,
                        skipped = report.skipped,
                        failed = report.failed,
                        "catch-up sweep completed"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "catch-up sweep failed");
                }
            }
        }
    })
}
