//! Queue batch handling

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::deploy::continuation::RunOutcome;
use crate::deploy::executor::PushExecutor;
use crate::models::{ChangeType, PushEvent, QueueBatch, QueueRecord, EVENT_TYPE_PUSH};

/// Per-batch record counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub reconciled: usize,
    pub continued: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Process every record of a batch in order.
///
/// Records are independent: a failure or panic on one is logged and the
/// rest of the batch still runs.
pub async fn handle_batch(executor: &PushExecutor, batch: QueueBatch, started: Instant) -> BatchReport {
    let mut report = BatchReport::default();
    info!(records = batch.records.len(), "Handling queue batch");

    for record in batch.records {
        let Some(event) = decode(&record) else {
            report.skipped += 1;
            continue;
        };

        let result = AssertUnwindSafe(executor.process(event, started))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(RunOutcome::Finished(_))) => report.reconciled += 1,
            Ok(Ok(RunOutcome::Continued)) => report.continued += 1,
            Ok(Err(_)) => report.failed += 1,
            Err(panic) => {
                error!(id = %record.item.id, panic = panic_message(&panic), "Record processing panicked");
                report.failed += 1;
            }
        }
    }

    info!(?report, "Queue batch handled");
    report
}

fn decode(record: &QueueRecord) -> Option<PushEvent> {
    if record.event_name != ChangeType::Insert {
        warn!(id = %record.item.id, change = ?record.event_name, "Skipping non-insert record");
        return None;
    }

    if record.item.event_type != EVENT_TYPE_PUSH {
        warn!(id = %record.item.id, event_type = %record.item.event_type, "Skipping non-push event");
        return None;
    }

    match serde_json::from_str(&record.item.payload) {
        Ok(event) => Some(event),
        Err(e) => {
            error!(id = %record.item.id, error = %e, "Failed to decode push event");
            None
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
