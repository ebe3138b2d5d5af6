use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapters::Navigator;
use crate::resolver::DeepLinkResolver;
use crate::types::{AttachOutcome, NavigationTarget, NotificationPayload};

/// Single subscription to "notification tapped" events
pub struct TapListener {
    resolver: Arc<DeepLinkResolver>,
    navigator: Arc<dyn Navigator>,
    attached: AtomicBool,
}

impl TapListener {
    pub fn new(resolver: Arc<DeepLinkResolver>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            resolver,
            navigator,
            attached: AtomicBool::new(false),
        }
    }

    /// Handle one tap. Payloads without a class id are ignored.
    ///
    /// Returns the target handed to the navigator.
    pub async fn handle_tap(&self, payload: NotificationPayload) -> Option<NavigationTarget> {
        let Some(clase_id) = payload.clase_id else {
            debug!("Tapped notification carries no claseId");
            return None;
        };

        let target = self.resolver.resolve(&clase_id, payload.reserva).await;
        if let Err(e) = self.navigator.navigate(target.clone()).await {
            warn!(clase_id = %clase_id, error = %e, "Navigation ignored");
        }
        Some(target)
    }

    /// Subscribe to the tap event source. Only the first call subscribes;
    /// later receivers are dropped.
    pub fn attach(self: &Arc<Self>, mut events: mpsc::Receiver<NotificationPayload>) -> AttachOutcome {
        if self.attached.swap(true, Ordering::SeqCst) {
            warn!("Tap listener already attached");
            return AttachOutcome::AlreadyAttached;
        }

        let listener = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(payload) = events.recv().await {
                listener.handle_tap(payload).await;
            }
            info!("Tap event source closed");
        });

        AttachOutcome::Attached
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}
