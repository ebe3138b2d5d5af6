pub mod log;

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::types::{LocalNotification, NavigationTarget};

/// OS-level local notification surface
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// Present a notification immediately
    async fn schedule(&self, notification: &LocalNotification) -> Result<(), NotificationError>;
}

/// In-app navigation layer
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigate to the target; fails when the navigator is not ready yet
    async fn navigate(&self, target: NavigationTarget) -> Result<(), NotificationError>;
}

pub use self::log::{LogNavigator, LogPresenter};
