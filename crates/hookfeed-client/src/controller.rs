use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use hookfeed_core::events::{EventRecord, EventsResponse, TestEventKind};
use hookfeed_core::notify::Notification;
use hookfeed_core::status::{PollingState, StatusIndicator};

use crate::error::FetchError;
use crate::scheduler::{ScheduleHandle, ScheduledTask, Scheduler, scheduled_task};
use crate::source::EventSource;

/// Cadence of scheduled polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Delay between a successful test event and the refresh that shows it.
pub const TEST_EVENT_REFRESH_DELAY: Duration = Duration::from_millis(500);

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load events. Please check your connection.";
pub const REFRESHED_MESSAGE: &str = "Events refreshed successfully!";

/// Result of a single fetch-and-render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The feed was replaced with `count` events reported by the server.
    Updated { count: u64 },
    /// The fetch failed; the previous feed is kept.
    Failed,
    /// The controller was disposed; no fetch was made.
    Disposed,
}

/// Growth of the server-side event count between two successful polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEvents {
    pub previous: u64,
    pub current: u64,
}

impl NewEvents {
    pub fn delta(&self) -> u64 {
        self.current.saturating_sub(self.previous)
    }
}

type StatusObserver = Arc<dyn Fn(StatusIndicator) + Send + Sync>;
type FeedObserver = Arc<dyn Fn(&[EventRecord]) + Send + Sync>;
type NotificationObserver = Arc<dyn Fn(&Notification) + Send + Sync>;
type NewEventsObserver = Arc<dyn Fn(NewEvents) + Send + Sync>;

#[derive(Default)]
struct Observers {
    status: Vec<StatusObserver>,
    feed: Vec<FeedObserver>,
    notification: Vec<NotificationObserver>,
    new_events: Vec<NewEventsObserver>,
}

struct ControllerState {
    polling: PollingState,
    schedule: Option<ScheduleHandle>,
    /// Bumped on every start so callbacks from an older schedule can tell they are stale.
    schedule_generation: u64,
    status: StatusIndicator,
    feed: Arc<[EventRecord]>,
    last_known_count: u64,
    /// Fetches issued by `tick` that have not settled yet.
    in_flight: usize,
    disposed: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            polling: PollingState::Stopped,
            schedule: None,
            schedule_generation: 0,
            status: StatusIndicator::Disconnected,
            feed: Arc::from(Vec::new()),
            last_known_count: 0,
            in_flight: 0,
            disposed: false,
        }
    }
}

impl ControllerState {
    /// Returns true if the status actually changed.
    fn replace_status(&mut self, status: StatusIndicator) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}

struct Inner {
    source: Arc<dyn EventSource>,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<ControllerState>,
    observers: Mutex<Observers>,
}

/// Drives the periodic fetch-and-render cycle of the event feed.
///
/// Cloning yields another handle to the same controller. All state changes
/// are reported through the `on_*` observer registrations; observers run on
/// whichever task completed the change, after internal locks are released.
#[derive(Clone)]
pub struct PollController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PollController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("PollController")
            .field("polling", &state.polling)
            .field("status", &state.status)
            .field("events", &state.feed.len())
            .field("last_known_count", &state.last_known_count)
            .finish()
    }
}

impl PollController {
    pub fn new(source: Arc<dyn EventSource>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                scheduler,
                state: Mutex::new(ControllerState::default()),
                observers: Mutex::new(Observers::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> MutexGuard<'_, Observers> {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ---- observers ----

    pub fn on_status_changed(&self, f: impl Fn(StatusIndicator) + Send + Sync + 'static) {
        self.observers().status.push(Arc::new(f));
    }

    pub fn on_feed_updated(&self, f: impl Fn(&[EventRecord]) + Send + Sync + 'static) {
        self.observers().feed.push(Arc::new(f));
    }

    pub fn on_notification(&self, f: impl Fn(&Notification) + Send + Sync + 'static) {
        self.observers().notification.push(Arc::new(f));
    }

    /// Advisory hook fired when the server-side count grew. Never affects rendering.
    pub fn on_new_events(&self, f: impl Fn(NewEvents) + Send + Sync + 'static) {
        self.observers().new_events.push(Arc::new(f));
    }

    fn emit_status(&self, status: StatusIndicator) {
        let observers = self.observers().status.clone();
        for observer in observers {
            observer(status);
        }
    }

    fn emit_feed(&self, feed: &[EventRecord]) {
        let observers = self.observers().feed.clone();
        for observer in observers {
            observer(feed);
        }
    }

    fn emit_new_events(&self, growth: NewEvents) {
        let observers = self.observers().new_events.clone();
        for observer in observers {
            observer(growth);
        }
    }

    fn notify(&self, notification: Notification) {
        let observers = self.observers().notification.clone();
        for observer in observers {
            observer(&notification);
        }
    }

    fn set_status(&self, status: StatusIndicator) {
        let changed = self.state().replace_status(status);
        if changed {
            tracing::debug!(%status, "Status changed");
            self.emit_status(status);
        }
    }

    // ---- accessors ----

    pub fn status(&self) -> StatusIndicator {
        self.state().status
    }

    pub fn polling_state(&self) -> PollingState {
        self.state().polling
    }

    /// Snapshot of the feed from the last successful fetch.
    pub fn feed(&self) -> Arc<[EventRecord]> {
        Arc::clone(&self.state().feed)
    }

    pub fn last_known_count(&self) -> u64 {
        self.state().last_known_count
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    // ---- lifecycle ----

    /// Begin polling every [`POLL_INTERVAL`]. No-op while already active.
    ///
    /// Does not fetch immediately; callers wanting data right away follow up
    /// with [`tick`](Self::tick).
    pub fn start(&self) {
        {
            let mut state = self.state();
            if state.disposed {
                tracing::debug!("Ignoring start on disposed controller");
                return;
            }
            if state.polling == PollingState::Active {
                return;
            }
            state.polling = PollingState::Active;
            state.schedule_generation += 1;
            let task = self.scheduled_tick(state.schedule_generation);
            state.schedule = Some(
                self.inner
                    .scheduler
                    .schedule_repeating(POLL_INTERVAL, task),
            );
        }
        self.set_status(StatusIndicator::Connected);
        tracing::info!(interval_secs = POLL_INTERVAL.as_secs(), "Started polling for events");
    }

    /// Cancel future scheduled polls. A fetch already in flight still completes
    /// and applies its result.
    pub fn stop(&self) {
        let schedule = {
            let mut state = self.state();
            if state.polling == PollingState::Stopped {
                return;
            }
            state.polling = PollingState::Stopped;
            state.schedule.take()
        };
        if let Some(schedule) = schedule {
            schedule.cancel();
        }
        self.set_status(StatusIndicator::Disconnected);
        tracing::info!("Stopped polling for events");
    }

    /// React to the page becoming hidden or visible.
    ///
    /// Hidden pages keep polling. On becoming visible, polling is resumed if
    /// needed and one immediate tick runs outside the schedule.
    pub async fn on_visibility_change(&self, hidden: bool) -> Option<TickOutcome> {
        if hidden {
            tracing::debug!("Page hidden, continuing polling in background");
            return None;
        }
        if self.is_disposed() {
            return None;
        }
        tracing::debug!("Page visible, ensuring polling is active");
        if self.polling_state() == PollingState::Stopped {
            self.start();
        }
        Some(self.tick().await)
    }

    /// Release the timer before teardown.
    pub fn on_unload(&self) {
        self.stop();
    }

    /// Stop polling, drop every observer and refuse further starts.
    pub fn dispose(&self) {
        self.stop();
        self.state().disposed = true;
        *self.observers() = Observers::default();
    }

    fn scheduled_tick(&self, generation: u64) -> ScheduledTask {
        let weak = Arc::downgrade(&self.inner);
        scheduled_task(move || {
            let weak = Weak::clone(&weak);
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let controller = PollController { inner };
                if !controller.owns_schedule(generation) {
                    tracing::trace!(generation, "Skipping tick from stale schedule");
                    return;
                }
                controller.tick().await;
            }
        })
    }

    fn one_shot_tick(&self) -> ScheduledTask {
        let weak = Arc::downgrade(&self.inner);
        scheduled_task(move || {
            let weak = Weak::clone(&weak);
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let controller = PollController { inner };
                if controller.is_disposed() {
                    return;
                }
                controller.tick().await;
            }
        })
    }

    fn owns_schedule(&self, generation: u64) -> bool {
        let state = self.state();
        state.polling == PollingState::Active && state.schedule_generation == generation
    }

    // ---- cycles ----

    /// Run one fetch-and-render cycle. Failures are reported through status and
    /// notifications, never returned.
    ///
    /// Overlapping ticks all apply their result as they complete, so the fetch
    /// that completes last owns the feed. Status stays `Loading` until every
    /// fetch in flight has settled.
    pub async fn tick(&self) -> TickOutcome {
        {
            let mut state = self.state();
            if state.disposed {
                tracing::trace!("Ignoring tick on disposed controller");
                return TickOutcome::Disposed;
            }
            state.in_flight += 1;
        }
        self.set_status(StatusIndicator::Loading);

        let result = self.inner.source.fetch_events().await;
        self.apply_fetch(result)
    }

    fn apply_fetch(&self, result: Result<EventsResponse, FetchError>) -> TickOutcome {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);
        let settled = state.in_flight == 0;

        match result {
            Ok(response) => {
                let previous = state.last_known_count;
                let count = response.count;
                let feed: Arc<[EventRecord]> = Arc::from(response.events);
                state.feed = Arc::clone(&feed);
                state.last_known_count = count;
                let status_changed = settled && state.replace_status(StatusIndicator::Connected);
                drop(state);

                tracing::debug!(count, shown = feed.len(), "Feed updated");
                self.emit_feed(&feed);
                if status_changed {
                    self.emit_status(StatusIndicator::Connected);
                }
                if count > previous {
                    let growth = NewEvents {
                        previous,
                        current: count,
                    };
                    tracing::info!(new = growth.delta(), total = count, "New events detected");
                    self.emit_new_events(growth);
                }
                TickOutcome::Updated { count }
            },
            Err(err) => {
                let status_changed =
                    settled && state.replace_status(StatusIndicator::Disconnected);
                drop(state);

                tracing::warn!(kind = err.kind(), error = %err, "Failed to load events");
                if status_changed {
                    self.emit_status(StatusIndicator::Disconnected);
                }
                self.notify(Notification::error(LOAD_FAILED_MESSAGE));
                TickOutcome::Failed
            },
        }
    }

    /// Manual refresh: a tick plus a confirmation when it succeeded.
    pub async fn refresh(&self) -> TickOutcome {
        let outcome = self.tick().await;
        if matches!(outcome, TickOutcome::Updated { .. }) {
            self.notify(Notification::success(REFRESHED_MESSAGE));
        }
        outcome
    }

    /// Ask the server to create a test event, then refresh shortly after.
    ///
    /// The follow-up refresh is a one-shot and does not touch the recurring
    /// schedule.
    pub async fn send_test_event(&self, kind: TestEventKind) -> Result<(), FetchError> {
        self.set_status(StatusIndicator::Loading);
        match self.inner.source.send_test_event(kind).await {
            Ok(()) => {
                tracing::info!(%kind, "Test event created");
                self.notify(Notification::success(format!(
                    "Test {kind} event created successfully!"
                )));
                self.inner
                    .scheduler
                    .schedule_once(TEST_EVENT_REFRESH_DELAY, self.one_shot_tick());
                Ok(())
            },
            Err(err) => {
                tracing::warn!(%kind, kind_code = err.kind(), error = %err, "Failed to create test event");
                self.set_status(StatusIndicator::Disconnected);
                self.notify(Notification::error(format!(
                    "Failed to create test {kind} event: {}",
                    err.user_message()
                )));
                Err(err)
            },
        }
    }

    /// Remove every stored event on the server and reload the feed.
    pub async fn clear_events(&self) -> Result<(), FetchError> {
        self.set_status(StatusIndicator::Loading);
        match self.inner.source.clear_events().await {
            Ok(message) => {
                tracing::info!(%message, "Events cleared");
                let message = if message.is_empty() {
                    "Events cleared".to_string()
                } else {
                    message
                };
                self.notify(Notification::success(message));
                self.tick().await;
                Ok(())
            },
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "Failed to clear events");
                self.set_status(StatusIndicator::Disconnected);
                self.notify(Notification::error(format!(
                    "Failed to clear events: {}",
                    err.user_message()
                )));
                Err(err)
            },
        }
    }
}
