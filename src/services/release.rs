//! Deferred release of reconditioning copies
//!
//! After a return the copy stays in `reconditioning` for a configured delay,
//! then goes back to `available` unless something else changed it meanwhile.
//! Timers live only in memory: a restart forgets them.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

use crate::{
    error::{AppError, AppResult},
    repository::copies::CopiesRepository,
};

/// Store operation run when a timer fires
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CopyRelease: Send + Sync + 'static {
    /// Set the copy `available` if it is still `reconditioning`
    async fn release_if_reconditioning(&self, copy_id: i32) -> AppResult<bool>;
}

#[async_trait]
impl CopyRelease for CopiesRepository {
    async fn release_if_reconditioning(&self, copy_id: i32) -> AppResult<bool> {
        CopiesRepository::release_if_reconditioning(self, copy_id).await
    }
}

/// Identifies a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseKey {
    pub copy_id: i32,
    pub due_at: DateTime<Utc>,
}

struct PendingRelease {
    key: ReleaseKey,
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    by_copy: HashMap<i32, PendingRelease>,
    next_generation: u64,
}

type PendingTimers = Arc<Mutex<Timers>>;

#[derive(Clone)]
pub struct ReleaseScheduler {
    store: Arc<dyn CopyRelease>,
    delay: Duration,
    pending: PendingTimers,
}

impl ReleaseScheduler {
    pub fn new(store: Arc<dyn CopyRelease>, delay_minutes: i64) -> Self {
        let delay = Duration::from_secs(delay_minutes.max(0) as u64 * 60);
        Self {
            store,
            delay,
            pending: Arc::new(Mutex::new(Timers::default())),
        }
    }

    pub fn delay_minutes(&self) -> i64 {
        (self.delay.as_secs() / 60) as i64
    }

    /// Start a timer releasing `copy_id` one delay after `now`.
    ///
    /// Fails when called outside a tokio runtime. Any timer still pending
    /// for the same copy is aborted: only the latest reconditioning period
    /// of a copy can release it.
    pub fn schedule(&self, copy_id: i32, now: DateTime<Utc>) -> AppResult<ReleaseKey> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::Internal(format!("No runtime for release timer: {}", e)))?;

        let offset = chrono::Duration::from_std(self.delay)
            .map_err(|e| AppError::Internal(format!("Invalid release delay: {}", e)))?;
        let key = ReleaseKey { copy_id, due_at: now + offset };
        let deadline = Instant::now() + self.delay;

        let store = self.store.clone();
        let pending = self.pending.clone();

        // Hold the map while spawning so the task cannot look up its entry
        // before it is inserted.
        let mut timers = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let generation = timers.next_generation;
        timers.next_generation += 1;

        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            match store.release_if_reconditioning(copy_id).await {
                Ok(true) => tracing::info!("Copy {} released after reconditioning", copy_id),
                Ok(false) => tracing::debug!("Copy {} no longer reconditioning, nothing to release", copy_id),
                Err(e) => tracing::warn!("Failed to release copy {}: {}", copy_id, e),
            }

            let mut timers = pending.lock().unwrap_or_else(|e| e.into_inner());
            if timers.by_copy.get(&copy_id).map(|p| p.generation) == Some(generation) {
                timers.by_copy.remove(&copy_id);
            }
        });

        let replaced = timers.by_copy.insert(copy_id, PendingRelease { key, generation, task });
        if let Some(previous) = replaced {
            previous.task.abort();
            tracing::debug!(
                "Copy {} rescheduled, dropped release due at {}",
                copy_id,
                previous.key.due_at
            );
        }

        Ok(key)
    }

    /// Schedule a release, logging instead of failing.
    ///
    /// Returns the expected release instant when the timer was started.
    pub fn schedule_best_effort(&self, copy_id: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.schedule(copy_id, now) {
            Ok(key) => Some(key.due_at),
            Err(e) => {
                tracing::warn!(
                    "Could not schedule release of copy {}; it stays in reconditioning: {}",
                    copy_id,
                    e
                );
                None
            }
        }
    }

    /// Number of timers not fired yet
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).by_copy.len()
    }

    /// Abort all pending timers.
    ///
    /// The affected copies stay in `reconditioning` until someone changes
    /// them by hand. Returns how many timers were dropped.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<PendingRelease> = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .by_copy
            .drain()
            .map(|(_, pending)| pending)
            .collect();

        if drained.is_empty() {
            return 0;
        }

        let mut copies: Vec<i32> = drained.iter().map(|p| p.key.copy_id).collect();
        copies.sort_unstable();

        for pending in drained {
            pending.task.abort();
        }

        tracing::warn!(
            "Dropped {} pending release timer(s); copies {:?} remain in reconditioning",
            copies.len(),
            copies
        );
        copies.len()
    }
}
