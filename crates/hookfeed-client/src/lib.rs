pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod source;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use config::ClientConfig;
pub use controller::{NewEvents, POLL_INTERVAL, PollController, TickOutcome};
pub use error::FetchError;
pub use scheduler::{ScheduleHandle, Scheduler, TokioScheduler};
pub use source::{EventSource, HttpEventSource};
