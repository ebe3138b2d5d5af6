use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::{Navigator, NotificationPresenter};
use crate::backend::BookingBackend;
use crate::config::PollingConfig;
use crate::dedup::DedupCache;
use crate::dispatcher::NotificationDispatcher;
use crate::error::NotificationError;
use crate::resolver::DeepLinkResolver;
use crate::scheduler::PollingScheduler;
use crate::session::SessionStore;
use crate::tap::TapListener;
use crate::types::{
    AttachOutcome, ClassId, CycleReport, NavigationTarget, NotificationPayload,
    NotificationRecord, ReservationSnapshot, StartOutcome, StopMode, UserId,
};

/// Notification subsystem of the client.
///
/// Built once at startup and shared by reference with the call sites that
/// start or stop polling (login, logout) and with the tap event source.
pub struct NotificationService {
    backend: Arc<dyn BookingBackend>,
    session: SessionStore,
    scheduler: PollingScheduler,
    resolver: Arc<DeepLinkResolver>,
    taps: Arc<TapListener>,
}

impl NotificationService {
    pub fn new(
        config: PollingConfig,
        backend: Arc<dyn BookingBackend>,
        session: SessionStore,
        presenter: Arc<dyn NotificationPresenter>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, NotificationError> {
        config.validate()?;

        let delivered = Arc::new(DedupCache::from_config(&config));
        let dispatcher = Arc::new(NotificationDispatcher::new(presenter, delivered));
        let scheduler =
            PollingScheduler::new(backend.clone(), session.clone(), dispatcher, &config);
        let resolver = Arc::new(DeepLinkResolver::new(backend.clone(), session.clone()));
        let taps = Arc::new(TapListener::new(resolver.clone(), navigator));

        Ok(Self {
            backend,
            session,
            scheduler,
            resolver,
            taps,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Application start: let the server materialise due notifications
    /// before the first poll. Failures are only logged.
    pub async fn prime(&self) {
        if let Err(e) = self.backend.generate_notifications().await {
            warn!(error = %e, "Initial notification generation failed");
        }
    }

    /// Best effort; returns whether the backend accepted the token.
    pub async fn register_push_token(&self, token: &str) -> bool {
        match self.backend.save_push_token(token).await {
            Ok(()) => {
                info!("Push token registered");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to register push token");
                false
            }
        }
    }

    pub async fn start_polling(&self, user_id: Option<UserId>) -> StartOutcome {
        self.scheduler.start(user_id).await
    }

    pub async fn stop_polling(&self, mode: StopMode) -> bool {
        self.scheduler.stop(mode).await
    }

    pub async fn is_polling(&self) -> bool {
        self.scheduler.is_running().await
    }

    pub async fn polling_user(&self) -> Option<UserId> {
        self.scheduler.current_user().await
    }

    pub async fn poll_once(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Option<CycleReport>, NotificationError> {
        self.scheduler.poll_once(user_id).await
    }

    pub async fn resolve(
        &self,
        clase_id: &ClassId,
        carried: Option<ReservationSnapshot>,
    ) -> NavigationTarget {
        self.resolver.resolve(clase_id, carried).await
    }

    pub async fn handle_tap(&self, payload: NotificationPayload) -> Option<NavigationTarget> {
        self.taps.handle_tap(payload).await
    }

    pub fn attach_tap_listener(
        &self,
        events: mpsc::Receiver<NotificationPayload>,
    ) -> AttachOutcome {
        self.taps.attach(events)
    }

    /// Last persisted batch, for "pending notifications" indicators.
    /// An unreadable snapshot reads as empty.
    pub async fn last_batch(&self) -> Vec<NotificationRecord> {
        self.session.notifications().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not read stored notifications");
            Vec::new()
        })
    }

    /// Logout: stop polling, forget delivered ids and drop the session.
    pub async fn end_session(&self) -> Result<(), NotificationError> {
        self.scheduler.stop(StopMode::EndSession).await;
        self.session.clear().await?;
        info!("Session ended");
        Ok(())
    }
}
