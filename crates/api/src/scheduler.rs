//! In-process cron: runs the log processor on a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::interactions::LogProcessor;

/// Spawns the processing loop. An interval of zero disables it.
///
/// The first run happens one full interval after startup.
pub fn spawn(processor: LogProcessor, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("in-process log processing disabled");
        return None;
    }

    let period = Duration::from_secs(interval_secs);
    tracing::info!(interval_secs, "scheduling log processing");

    Some(tokio::spawn(async move {
        loop {
            tokio::time::sleep(period).await;

            match processor.run().await {
                Ok(summary) => tracing::info!(
                    files = summary.files,
                    actions = summary.actions,
                    "scheduled run: {summary}"
                ),
                Err(e) => tracing::error!(error = ?e, "scheduled log processing failed"),
            }
        }
    }))
}
