//! Background producers: the recurring refresh timer and the push forwarder.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::state::{Event, Generation, InboxUpdate};
use crate::api::MailApi;
use crate::clock::Clock;
use crate::model::Message;

/// What a refresh timer polls for.
pub struct RefreshJob<A> {
    /// Service to poll.
    pub api: Arc<A>,
    /// Address whose inbox is fetched.
    pub address: String,
    /// Polling stops once the clock reaches this time.
    pub expires_at: DateTime<Utc>,
    /// Wall clock used for the expiry check.
    pub clock: Arc<dyn Clock>,
    /// Generation stamped on every event.
    pub generation: Generation,
    /// Where events go.
    pub events: mpsc::UnboundedSender<Event>,
}

/// A single recurring refresh task.
///
/// Starting the timer again replaces the running task, so at most one
/// timer polls at any time.
#[derive(Debug)]
pub struct RefreshTimer {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    /// Creates a stopped timer.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// Starts polling, cancelling any previous task first.
    ///
    /// The first poll happens one period after the call.
    pub fn start<A: MailApi>(&mut self, job: RefreshJob<A>) {
        self.stop();
        tracing::debug!(
            address = %job.address,
            generation = job.generation,
            period_secs = self.period.as_secs(),
            "starting refresh timer"
        );
        self.task = Some(tokio::spawn(run_timer(job, self.period)));
    }

    /// Cancels the running task, if any.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Returns true while a task is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer<A: MailApi>(job: RefreshJob<A>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // consume immediate first tick

    loop {
        ticker.tick().await;

        if job.clock.now() >= job.expires_at {
            tracing::info!(address = %job.address, "session expired, refresh timer stopping");
            let _ = job.events.send(Event::Expired {
                generation: job.generation,
            });
            break;
        }

        tracing::debug!(address = %job.address, "refreshing inbox");
        let event = match job.api.fetch_inbox(&job.address).await {
            Ok(messages) => Event::Inbox {
                generation: job.generation,
                update: InboxUpdate::ReplaceAll(messages),
            },
            Err(error) => {
                tracing::warn!(address = %job.address, error = %error, "inbox refresh failed");
                Event::RefreshFailed {
                    generation: job.generation,
                    error,
                }
            }
        };

        if job.events.send(event).is_err() {
            break;
        }
    }
}

/// Forwards pushed messages as [`InboxUpdate::Prepend`] events until the
/// subscription ends.
pub fn spawn_push_forwarder(
    mut messages: mpsc::UnboundedReceiver<Message>,
    generation: Generation,
    events: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            tracing::debug!(id = %message.id, "pushed message");
            let event = Event::Inbox {
                generation,
                update: InboxUpdate::Prepend(message),
            };
            if events.send(event).is_err() {
                break;
            }
        }
        tracing::debug!(generation, "push subscription ended");
    })
}
