//! Bounded fan-out for per-item catalogue lookups.
//!
//! Every batch runs at most `max_concurrency` items at a time. Each worker
//! slot owns a [`Throttle`] so that the delay between two requests of the
//! same slot is respected without serialising the whole batch.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Result, ToolError};

/// Tuning for batch execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub max_concurrency: usize,
    /// Minimum spacing between two requests of one worker slot.
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            delay: Duration::from_secs(2),
        }
    }
}

/// Shared flag telling running batches to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Spaces out the requests issued by one worker slot.
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    last_request: Arc<tokio::sync::Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Waits until `delay` has elapsed since the previous request, then
    /// records a new one.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Runs `op` over every item and returns the outputs in input order.
///
/// Returns [`ToolError::Cancelled`] as soon as `cancel` is raised; outputs
/// gathered so far are dropped.
pub async fn run_batch<I, T, F, Fut>(
    items: Vec<I>,
    options: BatchOptions,
    cancel: &CancellationFlag,
    op: F,
) -> Result<Vec<T>>
where
    F: Fn(I, Throttle) -> Fut,
    Fut: Future<Output = T>,
{
    let workers = options.max_concurrency.max(1);
    let total = items.len();
    // buffer_unordered never polls more than `workers` items at once, so the
    // pool cannot run dry.
    let pool: Mutex<Vec<Throttle>> = Mutex::new(
        (0..workers)
            .map(|_| Throttle::new(options.delay))
            .collect(),
    );
    let pool = &pool;
    let op = &op;

    let mut stream = futures::stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| async move {
            if cancel.is_cancelled() {
                return (idx, None);
            }
            let throttle = take_slot(pool, options.delay);
            let output = op(item, throttle.clone()).await;
            release_slot(pool, throttle);
            (idx, Some(output))
        })
        .buffer_unordered(workers);

    let mut outputs: Vec<(usize, T)> = Vec::with_capacity(total);
    while let Some((idx, output)) = stream.next().await {
        match output {
            Some(output) if !cancel.is_cancelled() => {
                outputs.push((idx, output));
                debug!(done = outputs.len(), total, "batch item finished");
            }
            _ => return Err(ToolError::Cancelled),
        }
    }

    outputs.sort_by_key(|(idx, _)| *idx);
    Ok(outputs.into_iter().map(|(_, output)| output).collect())
}

fn take_slot(pool: &Mutex<Vec<Throttle>>, delay: Duration) -> Throttle {
    pool.lock()
        .ok()
        .and_then(|mut slots| slots.pop())
        .unwrap_or_else(|| Throttle::new(delay))
}

fn release_slot(pool: &Mutex<Vec<Throttle>>, throttle: Throttle) {
    if let Ok(mut slots) = pool.lock() {
        slots.push(throttle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> BatchOptions {
        BatchOptions {
            max_concurrency: 3,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn keeps_input_order() {
        let cancel = CancellationFlag::new();
        let items: Vec<u64> = vec![30, 10, 20, 0];
        let out = run_batch(items, fast(), &cancel, |ms, _| async move {
            sleep(Duration::from_millis(ms)).await;
            ms * 2
        })
        .await
        .expect("batch completes");
        assert_eq!(out, vec![60, 20, 40, 0]);
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let cancel = CancellationFlag::new();
        let out: Vec<u8> = run_batch(Vec::<u8>::new(), fast(), &cancel, |x, _| async move { x })
            .await
            .expect("batch completes");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn cancelled_batch_reports_cancellation() {
        let cancel = CancellationFlag::new();
        let trigger = cancel.clone();
        let result = run_batch(vec![1, 2, 3, 4], fast(), &cancel, |x, _| {
            let trigger = trigger.clone();
            async move {
                if x == 2 {
                    trigger.cancel();
                }
                x
            }
        })
        .await;
        assert!(matches!(result, Err(ToolError::Cancelled)));
    }

    #[tokio::test]
    async fn throttle_spaces_requests() {
        let throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
