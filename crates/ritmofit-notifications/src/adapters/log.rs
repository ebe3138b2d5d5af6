use async_trait::async_trait;
use tracing::info;

use super::{Navigator, NotificationPresenter};
use crate::error::NotificationError;
use crate::types::{LocalNotification, NavigationTarget};

/// Presenter that only records notifications in the log.
/// Used when no notification surface is available (headless runs).
#[derive(Debug, Default, Clone)]
pub struct LogPresenter;

#[async_trait]
impl NotificationPresenter for LogPresenter {
    async fn schedule(&self, notification: &LocalNotification) -> Result<(), NotificationError> {
        info!(
            title = %notification.title,
            body = %notification.body,
            clase_id = ?notification.payload.clase_id,
            "Local notification"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct LogNavigator;

#[async_trait]
impl Navigator for LogNavigator {
    async fn navigate(&self, target: NavigationTarget) -> Result<(), NotificationError> {
        info!(destination = ?target, "Navigate");
        Ok(())
    }
}
