//! Timer capability used by the poll controller.
//!
//! The controller never touches a clock directly; it asks a [`Scheduler`] to
//! run a task later and keeps the returned [`ScheduleHandle`] to cancel it.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// A task the scheduler can fire any number of times.
pub type ScheduledTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`ScheduledTask`].
pub fn scheduled_task<F, Fut>(f: F) -> ScheduledTask
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Cancellation handle for a scheduled task. Dropping it does not cancel.
#[derive(Debug, Clone, Default)]
pub struct ScheduleHandle {
    token: CancellationToken,
}

impl ScheduleHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevent any future firing. Firings already started run to completion.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Something that can run tasks after a delay or on a fixed cadence.
pub trait Scheduler: Send + Sync {
    /// Fire `task` every `interval`, first one interval from now.
    fn schedule_repeating(&self, interval: Duration, task: ScheduledTask) -> ScheduleHandle;

    /// Fire `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> ScheduleHandle;
}

/// Scheduler backed by the tokio timer.
///
/// Each firing is spawned as its own task, so a slow firing never delays or
/// queues the next one.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime of the calling task. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, task: ScheduledTask) -> ScheduleHandle {
        let schedule = ScheduleHandle::new();
        let token = schedule.token().clone();
        let spawner = self.handle.clone();
        // tokio intervals reject a zero period
        let interval = interval.max(Duration::from_millis(1));

        self.handle.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        spawner.spawn(task());
                    },
                }
            }
            tracing::debug!(?interval, "Repeating schedule cancelled");
        });

        schedule
    }

    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> ScheduleHandle {
        let schedule = ScheduleHandle::new();
        let token = schedule.token().clone();

        self.handle.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {},
                () = tokio::time::sleep(delay) => task().await,
            }
        });

        schedule
    }
}
