//! Scatter-gather over blocking lookups.
//!
//! One blocking task per key, one report per task, a single consumer that
//! stops at the first error.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{AppError, Result};

/// Runs `work` once per key on the blocking pool and collects the outcomes.
///
/// `Ok(Some(_))` values are kept, `Ok(None)` is discarded and the first
/// `Err` received is returned without waiting for the remaining tasks.
/// Results come back in completion order; callers sort as needed.
///
/// The channel holds one slot per task, so a task's single send never
/// blocks even after the consumer has returned; stragglers run to
/// completion and exit.
///
/// # Errors
/// Returns the first error any task reports, or a worker error if a task
/// exits without reporting.
pub async fn scatter_gather<K, T, F>(keys: Vec<K>, work: F) -> Result<Vec<T>>
where
    K: Send + 'static,
    T: Send + 'static,
    F: Fn(K) -> Result<Option<T>> + Send + Sync + 'static,
{
    let expected = keys.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let work = Arc::new(work);
    let (tx, mut rx) = mpsc::channel::<Result<Option<T>>>(expected);

    for key in keys {
        let tx = tx.clone();
        let work = Arc::clone(&work);
        tokio::task::spawn_blocking(move || {
            let outcome = work(key);
            // The receiver is gone once an earlier error was returned.
            let _ = tx.try_send(outcome);
        });
    }
    // The channel closes when the last task drops its sender.
    drop(tx);

    let mut gathered = Vec::new();
    let mut reported = 0;
    while let Some(outcome) = rx.recv().await {
        reported += 1;
        if let Some(value) = outcome? {
            gathered.push(value);
        }
    }

    if reported < expected {
        return Err(AppError::Worker {
            message: format!("{} of {expected} lookups never reported", expected - reported),
        });
    }

    Ok(gathered)
}
