//! Bounded-concurrency execution that keeps input order

use anyhow::{anyhow, Result};
use futures::{stream::FuturesUnordered, Future, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Context provided to each task in a batch
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// Position of the item in the input (0-indexed)
    pub index: usize,
    /// Total number of tasks in this batch
    pub total_tasks: usize,
}

/// Run `task_executor` over `items` with at most `batch_size` in flight
///
/// # Arguments
/// - `items`: Items to process
/// - `batch_size`: Maximum concurrent tasks (clamped to at least 1)
/// - `task_executor`: Function that processes each item, receives (item, context)
///
/// # Returns
/// One result per item, in input order
///
/// # Error Handling
/// Tasks run to completion independently; a failing item only fails its own
/// slot. The outer error is reserved for scheduler failures.
pub async fn execute_batch<T, F, Fut, R>(
    items: Vec<T>,
    batch_size: usize,
    task_executor: F,
) -> Result<Vec<Result<R>>>
where
    T: Send,
    R: Send,
    F: Fn(T, TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R>> + Send,
{
    let total = items.len();
    let sem = Arc::new(Semaphore::new(batch_size.max(1)));
    let executor = &task_executor;
    let mut tasks = FuturesUnordered::new();

    for (index, item) in items.into_iter().enumerate() {
        let sem = sem.clone();
        let ctx = TaskContext {
            index,
            total_tasks: total,
        };

        tasks.push(async move {
            let _permit = sem
                .acquire()
                .await
                .map_err(|_| anyhow!("Semaphore closed"))?;

            Ok::<_, anyhow::Error>((index, executor(item, ctx).await))
        });
    }

    let mut slots: Vec<Option<Result<R>>> = (0..total).map(|_| None).collect();
    while let Some(result) = tasks.next().await {
        let (index, outcome) = result?;
        slots[index] = Some(outcome);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| anyhow!("batch task lost")))
        .collect()
}
