//! Single owner of session and inbox state.
//!
//! User commands are methods on [`Coordinator`]; background results arrive
//! as [`Event`]s and are applied by [`Coordinator::process_next`] or
//! [`Coordinator::drain_events`]. Every mutation happens on the task that
//! owns the coordinator.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::manager::{RestoreOutcome, SessionManager};
use super::refresh::{RefreshJob, RefreshTimer, spawn_push_forwarder};
use super::state::{Event, Generation, InboxState, InboxUpdate, Notice, NoticeLevel};
use crate::api::{ApiStatus, MailApi, PushChannel};
use crate::clock::Clock;
use crate::model::{Inbox, Message, MessageId, Session};
use crate::render::{
    DEFAULT_PREVIEW_LEN, InboxRow, RenderedMessage, render_inbox, render_message, window_title,
};
use crate::store::KeyValueStore;
use crate::{Error, Result};

const EXPIRED_NOTICE: &str = "Your temporary address has expired. Generate a new one.";

/// Drives the session lifecycle, inbox refresh and push delivery.
pub struct Coordinator<A, P, S> {
    api: Arc<A>,
    push: P,
    sessions: SessionManager<S>,
    state: InboxState,
    timer: RefreshTimer,
    push_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    api_status: Option<ApiStatus>,
    preview_len: usize,
}

impl<A, P, S> Coordinator<A, P, S>
where
    A: MailApi,
    P: PushChannel,
    S: KeyValueStore,
{
    /// Creates a coordinator with no session.
    pub fn new(
        api: A,
        push: P,
        store: S,
        clock: Arc<dyn Clock>,
        refresh_interval: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            push,
            sessions: SessionManager::new(store, clock),
            state: InboxState::new(),
            timer: RefreshTimer::new(refresh_interval),
            push_task: None,
            events_tx,
            events_rx,
            api_status: None,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }

    /// Sets the preview length used by [`Coordinator::rows`].
    #[must_use]
    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    /// Checks service health and restores the persisted session.
    ///
    /// A restored session is refreshed immediately and then on every timer
    /// tick. A refresh failure here is reported as a notice only.
    ///
    /// # Errors
    ///
    /// Returns an error only if session storage cannot be accessed.
    pub async fn start(&mut self) -> Result<RestoreOutcome> {
        self.check_health().await;

        let outcome = self.sessions.restore()?;
        match &outcome {
            RestoreOutcome::Restored(_) => {
                self.activate();
                let _ = self.refresh_now().await;
            }
            RestoreOutcome::Expired(_) => self.state.notify(NoticeLevel::Warning, EXPIRED_NOTICE),
            RestoreOutcome::Missing | RestoreOutcome::Corrupt => {}
        }
        Ok(outcome)
    }

    /// Requests a new address and makes it the current session.
    ///
    /// The inbox starts empty and the refresh timer is restarted.
    ///
    /// # Errors
    ///
    /// Returns an error if the service refuses or the session cannot be
    /// persisted. The previous session stays in place in both cases.
    pub async fn generate(&mut self) -> Result<Session> {
        let generated = match self.api.generate_address().await {
            Ok(generated) => generated,
            Err(e) => {
                self.state
                    .notify(NoticeLevel::Error, format!("Failed to generate address: {e}"));
                return Err(e);
            }
        };

        let session = self
            .sessions
            .create(generated.address, generated.expires_at)?
            .clone();
        self.activate();
        self.state.notify(
            NoticeLevel::Success,
            format!("Temporary address created: {}", session.address),
        );
        Ok(session)
    }

    /// Fetches the inbox now and replaces the local copy.
    ///
    /// Returns the messages that were not in the inbox before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSession`] or [`Error::ExpiredSession`] without a
    /// usable session, or the fetch error. On a fetch error the inbox is
    /// left untouched and an error notice is queued.
    pub async fn refresh_now(&mut self) -> Result<Vec<Message>> {
        let address = self.active_address()?;
        match self.api.fetch_inbox(&address).await {
            Ok(messages) => Ok(self.state.apply(InboxUpdate::ReplaceAll(messages))),
            Err(e) => {
                self.report_refresh_failure(&e);
                Err(e)
            }
        }
    }

    /// Deletes all messages on the service and empties the local inbox.
    ///
    /// # Errors
    ///
    /// Returns an error without a usable session or if the service refuses;
    /// the local inbox is kept in the latter case.
    pub async fn clear_inbox(&mut self) -> Result<()> {
        let address = self.active_address()?;
        if let Err(e) = self.api.clear_inbox(&address).await {
            self.state
                .notify(NoticeLevel::Error, format!("Failed to clear inbox: {e}"));
            return Err(e);
        }
        self.state.inbox_mut().clear();
        self.state.notify(NoticeLevel::Success, "Inbox cleared");
        Ok(())
    }

    /// Forgets the current session, locally and in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be modified. Refresh and push are
    /// stopped regardless.
    pub fn clear_session(&mut self) -> Result<()> {
        self.deactivate();
        self.state.reset();
        self.sessions.clear()?;
        self.state.notify(NoticeLevel::Info, "Session cleared");
        Ok(())
    }

    /// Prepares a message for display and marks it read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the id is not in the inbox.
    pub fn open_message(&mut self, id: &MessageId) -> Result<RenderedMessage> {
        let now = self.sessions.now();
        let rendered = self
            .state
            .inbox()
            .get(id)
            .map(|message| render_message(message, now))
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;
        self.state.inbox_mut().mark_read(id);
        Ok(rendered)
    }

    /// Connectivity came back: refresh at once and re-check health.
    pub async fn on_online(&mut self) -> ApiStatus {
        tracing::info!("connection restored");
        self.state.notify(NoticeLevel::Success, "Connection restored");
        if self.sessions.current().is_some() {
            let _ = self.refresh_now().await;
        }
        self.check_health().await
    }

    /// Connectivity was lost.
    pub fn on_offline(&mut self) {
        tracing::warn!("connection lost");
        self.state.notify(
            NoticeLevel::Warning,
            "You are offline. New messages will appear once the connection is back.",
        );
    }

    /// Queries service health and remembers the answer.
    pub async fn check_health(&mut self) -> ApiStatus {
        let status = self.api.health().await;
        tracing::debug!(?status, "API health");
        self.api_status = Some(status);
        status
    }

    /// Waits for the next background event and applies it.
    ///
    /// Returns the messages that arrived with it.
    pub async fn process_next(&mut self) -> Vec<Message> {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event),
            None => Vec::new(),
        }
    }

    /// Applies every event that is already queued, without waiting.
    pub fn drain_events(&mut self) -> Vec<Message> {
        let mut arrived = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            arrived.extend(self.handle_event(event));
        }
        arrived
    }

    /// Applies one event; events from a superseded generation are dropped.
    pub fn handle_event(&mut self, event: Event) -> Vec<Message> {
        let generation = event.generation();
        if !self.state.is_current(generation) {
            tracing::debug!(
                generation,
                current = self.state.generation(),
                "dropping stale event"
            );
            return Vec::new();
        }
        if self.sessions.is_expired() {
            self.expire();
            return Vec::new();
        }

        match event {
            Event::Inbox { update, .. } => self.state.apply(update),
            Event::RefreshFailed { error, .. } => {
                self.report_refresh_failure(&error);
                Vec::new()
            }
            Event::Expired { .. } => {
                self.expire();
                Vec::new()
            }
        }
    }

    /// Takes pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    /// The current session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    /// Returns true if a session exists and has not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.sessions.is_active()
    }

    /// The inbox of the current session.
    #[must_use]
    pub const fn inbox(&self) -> &Inbox {
        self.state.inbox()
    }

    /// Display rows for the inbox, newest first.
    #[must_use]
    pub fn rows(&self) -> Vec<InboxRow> {
        render_inbox(self.state.inbox(), self.sessions.now(), self.preview_len)
    }

    /// Title for the current session, with the unread count.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.sessions
            .current()
            .map(|session| window_title(&session.address, self.state.inbox().unread_count()))
    }

    /// Last known service health.
    #[must_use]
    pub const fn api_status(&self) -> Option<ApiStatus> {
        self.api_status
    }

    /// Current session generation.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.state.generation()
    }

    /// Returns true while the refresh timer is scheduled.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.timer.is_running()
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.sessions.now()
    }

    /// Sender for injecting events, as a producer would.
    #[must_use]
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    /// Starts producers for the current session under a new generation.
    fn activate(&mut self) {
        self.deactivate();
        let generation = self.state.reset();
        let Some(session) = self.sessions.current() else {
            return;
        };
        let address = session.address.clone();

        self.timer.start(RefreshJob {
            api: Arc::clone(&self.api),
            address: address.clone(),
            expires_at: session.expires_at,
            clock: self.sessions.clock(),
            generation,
            events: self.events_tx.clone(),
        });

        let pushed = self.push.subscribe(&address);
        self.push_task = Some(spawn_push_forwarder(
            pushed,
            generation,
            self.events_tx.clone(),
        ));
    }

    /// Stops the timer and the push forwarder.
    fn deactivate(&mut self) {
        self.timer.stop();
        if let Some(task) = self.push_task.take() {
            task.abort();
        }
    }

    /// Tears down an expired session and asks for a new one.
    fn expire(&mut self) {
        if let Some(session) = self.sessions.current() {
            tracing::info!(address = %session.address, "session expired");
        }
        self.deactivate();
        self.state.reset();
        if let Err(e) = self.sessions.clear() {
            tracing::warn!(error = %e, "failed to remove expired session");
        }
        self.state.notify(NoticeLevel::Warning, EXPIRED_NOTICE);
    }

    /// Address of the usable session, expiring it if it is past due.
    fn active_address(&mut self) -> Result<String> {
        if self.sessions.is_expired() {
            self.expire();
            return Err(Error::ExpiredSession);
        }
        self.sessions
            .current()
            .map(|session| session.address.clone())
            .ok_or(Error::NoSession)
    }

    fn report_refresh_failure(&mut self, error: &Error) {
        if error.is_transient() {
            tracing::warn!(error = %error, "keeping previous inbox after failed refresh");
        } else {
            tracing::error!(error = %error, "refresh failed unexpectedly, keeping previous inbox");
        }
        self.state
            .notify(NoticeLevel::Error, format!("Failed to fetch messages: {error}"));
    }
}

impl<A, P, S> Drop for Coordinator<A, P, S> {
    fn drop(&mut self) {
        if let Some(task) = self.push_task.take() {
            task.abort();
        }
    }
}

impl<A, P, S> std::fmt::Debug for Coordinator<A, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("sessions", &self.sessions)
            .field("state", &self.state)
            .field("timer", &self.timer)
            .field("api_status", &self.api_status)
            .finish_non_exhaustive()
    }
}
