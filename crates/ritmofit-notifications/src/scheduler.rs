//! Notification polling loop.
//!
//! One loop per scheduler. Each cycle asks the backend to generate due
//! notifications, fetches the pending list, dispatches every record in list
//! order and persists the fetched batch. The generate call is a trigger only:
//! its failure is logged and the fetch still runs. A failing fetch or store
//! write fails the cycle, which is logged, and the next tick runs normally;
//! the server owns the pending set, so a missed cycle is recovered by the
//! next full fetch.
//!
//! Ticks come from a tokio interval with [`MissedTickBehavior::Delay`]. The
//! cycle runs inside the loop task, so cycles of one loop never overlap and a
//! slow cycle pushes the following tick back.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::backend::BookingBackend;
use crate::config::PollingConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::error::NotificationError;
use crate::session::SessionStore;
use crate::types::{CycleReport, DispatchOutcome, StartOutcome, StopMode, UserId};

/// One generate, fetch, dispatch, persist pass
#[derive(Clone)]
struct PollCycle {
    backend: Arc<dyn BookingBackend>,
    session: SessionStore,
    dispatcher: Arc<NotificationDispatcher>,
}

impl PollCycle {
    async fn run(&self, user_id: &UserId) -> Result<CycleReport, NotificationError> {
        if let Err(e) = self.backend.generate_notifications().await {
            warn!(user_id = %user_id, error = %e, "Notification generation failed");
        }

        let records = self.backend.pending_notifications(user_id).await?;
        let mut report = CycleReport::new(user_id.clone(), records.len());

        for record in &records {
            match self.dispatcher.dispatch(record).await {
                Ok(DispatchOutcome::Delivered) => report.delivered += 1,
                Ok(DispatchOutcome::Skipped(_)) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        notification_id = ?record.id,
                        error = %e,
                        "Failed to present notification"
                    );
                }
            }
        }

        self.session.save_notifications(&records).await?;
        report.completed_at = OffsetDateTime::now_utc();
        Ok(report)
    }
}

struct ActivePoll {
    user_id: UserId,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the polling state: at most one running loop.
pub struct PollingScheduler {
    cycle: PollCycle,
    poll_interval: Duration,
    active: Mutex<Option<ActivePoll>>,
}

impl PollingScheduler {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        session: SessionStore,
        dispatcher: Arc<NotificationDispatcher>,
        config: &PollingConfig,
    ) -> Self {
        Self {
            cycle: PollCycle {
                backend,
                session,
                dispatcher,
            },
            poll_interval: config.poll_interval,
            active: Mutex::new(None),
        }
    }

    /// Start polling for `user_id`, or for the stored session user.
    ///
    /// A running loop is left untouched, including its user. Without any
    /// user nothing is started.
    pub async fn start(&self, user_id: Option<UserId>) -> StartOutcome {
        let mut active = self.active.lock().await;

        if let Some(running) = active.as_ref()
            && !running.handle.is_finished()
        {
            debug!(user_id = %running.user_id, "Polling already running");
            return StartOutcome::AlreadyRunning;
        }

        let Some(user_id) = self.resolve_user(user_id).await else {
            info!("No signed-in user, polling not started");
            return StartOutcome::NoUser;
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            self.cycle.clone(),
            user_id.clone(),
            self.poll_interval,
            shutdown_rx,
        ));

        info!(
            user_id = %user_id,
            interval_secs = self.poll_interval.as_secs(),
            "Notification polling started"
        );

        *active = Some(ActivePoll {
            user_id: user_id.clone(),
            shutdown,
            handle,
        });
        StartOutcome::Started(user_id)
    }

    /// Stop the loop. A cycle already in flight is allowed to finish; no new
    /// cycle starts afterwards. `EndSession` also forgets delivered ids.
    ///
    /// Returns whether a loop was running.
    pub async fn stop(&self, mode: StopMode) -> bool {
        let mut active = self.active.lock().await;

        let was_running = match active.take() {
            Some(running) => {
                let _ = running.shutdown.send(true);
                if let Err(e) = running.handle.await {
                    warn!(error = %e, "Polling task ended abnormally");
                }
                info!(user_id = %running.user_id, "Notification polling stopped");
                true
            }
            None => false,
        };

        if mode == StopMode::EndSession {
            self.cycle.dispatcher.delivered().clear();
        }
        was_running
    }

    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// User of the running loop
    pub async fn current_user(&self) -> Option<UserId> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|running| !running.handle.is_finished())
            .map(|running| running.user_id.clone())
    }

    /// Run a single cycle outside the loop. `Ok(None)` when there is no user.
    pub async fn poll_once(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Option<CycleReport>, NotificationError> {
        match self.resolve_user(user_id).await {
            Some(user_id) => self.cycle.run(&user_id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn resolve_user(&self, explicit: Option<UserId>) -> Option<UserId> {
        if explicit.is_some() {
            return explicit;
        }
        match self.cycle.session.user_id().await {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!(error = %e, "Could not read stored user");
                None
            }
        }
    }
}

async fn run_loop(
    cycle: PollCycle,
    user_id: UserId,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(user_id = %user_id, "Polling loop shutting down");
                    break;
                }
            }
            _ = ticker.tick() => {
                match cycle.run(&user_id).await {
                    Ok(report) => {
                        if report.delivered > 0 || report.failed > 0 {
                            info!(
                                user_id = %user_id,
                                fetched = report.fetched,
                                delivered = report.delivered,
                                failed = report.failed,
                                "Polling cycle completed"
                            );
                        } else {
                            debug!(user_id = %user_id, fetched = report.fetched, "Polling cycle completed");
                        }
                    }
                    Err(e) if e.is_transient() => {
                        warn!(
                            user_id = %user_id,
                            error = %e,
                            "Polling cycle failed, retrying next tick"
                        );
                    }
                    Err(e) => {
                        error!(user_id = %user_id, error = %e, "Polling cycle failed");
                    }
                }
            }
        }
    }
}
