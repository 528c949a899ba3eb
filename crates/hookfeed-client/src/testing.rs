//! Deterministic stand-ins for the scheduler and the event source.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use hookfeed_core::events::{EventsResponse, TestEventKind};

use crate::error::FetchError;
use crate::scheduler::{ScheduleHandle, ScheduledTask, Scheduler};
use crate::source::EventSource;

struct ManualEntry {
    due: Duration,
    interval: Option<Duration>,
    task: ScheduledTask,
    handle: ScheduleHandle,
    seq: u64,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    entries: Vec<ManualEntry>,
    next_seq: u64,
}

/// Scheduler driven by virtual time. Tasks only fire inside [`advance`](Self::advance).
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(
        &self,
        delay: Duration,
        interval: Option<Duration>,
        task: ScheduledTask,
    ) -> ScheduleHandle {
        let handle = ScheduleHandle::new();
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay;
        state.entries.push(ManualEntry {
            due,
            interval,
            task,
            handle: handle.clone(),
            seq,
        });
        handle
    }

    /// Move virtual time forward, firing every due task in order and awaiting
    /// each one. Returns how many firings happened.
    pub async fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut fired = 0;
        loop {
            let task = {
                let mut state = self.lock();
                state.entries.retain(|e| !e.handle.is_cancelled());
                let next = state
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.seq))
                    .map(|(i, _)| i);
                let Some(idx) = next else {
                    state.now = target;
                    break;
                };
                state.now = state.entries[idx].due;
                let task = Arc::clone(&state.entries[idx].task);
                match state.entries[idx].interval {
                    Some(interval) => state.entries[idx].due += interval,
                    None => {
                        state.entries.remove(idx);
                    },
                }
                task
            };
            task().await;
            fired += 1;
        }
        fired
    }

    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of live (not cancelled) repeating schedules.
    pub fn active_repeating(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.interval.is_some() && !e.handle.is_cancelled())
            .count()
    }

    /// Number of live one-shot tasks still waiting to fire.
    pub fn pending_once(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.interval.is_none() && !e.handle.is_cancelled())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, task: ScheduledTask) -> ScheduleHandle {
        let interval = interval.max(Duration::from_millis(1));
        self.insert(interval, Some(interval), task)
    }

    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> ScheduleHandle {
        self.insert(delay, None, task)
    }
}

enum Scripted<T> {
    Ready(Result<T, FetchError>),
    Deferred(oneshot::Receiver<Result<T, FetchError>>),
}

impl<T: Send + 'static> Scripted<T> {
    async fn resolve(self) -> Result<T, FetchError> {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(rx) => rx.await.unwrap_or_else(|_| {
                Err(FetchError::Transport(
                    "deferred response dropped".to_string(),
                ))
            }),
        }
    }
}

/// Event source replaying scripted responses in order.
///
/// With nothing scripted, fetches return an empty list, test events and
/// clears succeed.
#[derive(Default)]
pub struct ScriptedSource {
    fetches: Mutex<VecDeque<Scripted<EventsResponse>>>,
    test_events: Mutex<VecDeque<Result<(), FetchError>>>,
    clears: Mutex<VecDeque<Result<String, FetchError>>>,
    fetch_calls: AtomicUsize,
    test_event_calls: Mutex<Vec<TestEventKind>>,
    clear_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_events(&self, response: EventsResponse) {
        lock(&self.fetches).push_back(Scripted::Ready(Ok(response)));
    }

    pub fn push_fetch_error(&self, err: FetchError) {
        lock(&self.fetches).push_back(Scripted::Ready(Err(err)));
    }

    /// Script a fetch that stays pending until the returned sender is used.
    pub fn defer_fetch(&self) -> oneshot::Sender<Result<EventsResponse, FetchError>> {
        let (tx, rx) = oneshot::channel();
        lock(&self.fetches).push_back(Scripted::Deferred(rx));
        tx
    }

    pub fn push_test_event_result(&self, result: Result<(), FetchError>) {
        lock(&self.test_events).push_back(result);
    }

    pub fn push_clear_result(&self, result: Result<String, FetchError>) {
        lock(&self.clears).push_back(result);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn test_event_calls(&self) -> Vec<TestEventKind> {
        lock(&self.test_event_calls).clone()
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl EventSource for ScriptedSource {
    fn fetch_events(&self) -> BoxFuture<'_, Result<EventsResponse, FetchError>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.fetches).pop_front();
        async move {
            match next {
                Some(scripted) => scripted.resolve().await,
                None => Ok(EventsResponse::default()),
            }
        }
        .boxed()
    }

    fn send_test_event(&self, kind: TestEventKind) -> BoxFuture<'_, Result<(), FetchError>> {
        lock(&self.test_event_calls).push(kind);
        let result = lock(&self.test_events).pop_front().unwrap_or(Ok(()));
        futures::future::ready(result).boxed()
    }

    fn clear_events(&self) -> BoxFuture<'_, Result<String, FetchError>> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        let result = lock(&self.clears)
            .pop_front()
            .unwrap_or_else(|| Ok("Cleared events".to_string()));
        futures::future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::scheduled_task;

    fn counting_task() -> (ScheduledTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let task = scheduled_task(move || {
            let inner = Arc::clone(&inner);
            async move {
                inner.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test]
    async fn manual_repeating_and_once() {
        let scheduler = ManualScheduler::new();
        let (repeating, repeats) = counting_task();
        let (once, onces) = counting_task();
        scheduler.schedule_repeating(Duration::from_secs(10), repeating);
        scheduler.schedule_once(Duration::from_secs(5), once);

        assert_eq!(scheduler.advance(Duration::from_secs(4)).await, 0);
        assert_eq!(scheduler.advance(Duration::from_secs(30)).await, 4);
        assert_eq!(repeats.load(Ordering::SeqCst), 3);
        assert_eq!(onces.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.now(), Duration::from_secs(34));
        assert_eq!(scheduler.pending_once(), 0);
        assert_eq!(scheduler.active_repeating(), 1);
    }

    #[tokio::test]
    async fn manual_cancelled_tasks_do_not_fire() {
        let scheduler = ManualScheduler::new();
        let (task, count) = counting_task();
        let handle = scheduler.schedule_repeating(Duration::from_secs(1), task);
        scheduler.advance(Duration::from_secs(2)).await;
        handle.cancel();
        scheduler.advance(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.active_repeating(), 0);
    }

    #[tokio::test]
    async fn scripted_source_replays_in_order() {
        let source = ScriptedSource::new();
        source.push_fetch_error(FetchError::Transport("offline".to_string()));
        source.push_events(EventsResponse::default());

        assert!(source.fetch_events().await.is_err());
        assert!(source.fetch_events().await.is_ok());
        // Nothing scripted: empty success
        assert_eq!(source.fetch_events().await.unwrap().count, 0);
        assert_eq!(source.fetch_calls(), 3);
    }

    #[tokio::test]
    async fn scripted_source_deferred_fetch() {
        let source = ScriptedSource::new();
        let tx = source.defer_fetch();
        let pending = source.fetch_events();
        tx.send(Ok(EventsResponse {
            events: vec![],
            count: 9,
        }))
        .unwrap();
        assert_eq!(pending.await.unwrap().count, 9);
    }
}
