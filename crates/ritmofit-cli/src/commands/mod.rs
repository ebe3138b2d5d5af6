pub mod notifications;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ritmofit_notifications::{
    FileKeyValueStore, HttpBookingBackend, NotificationService, SessionStore,
};
use tracing::debug;

use crate::config::AppConfig;
use crate::console::{ConsoleNavigator, ConsolePresenter};

pub fn open_session(cfg: &AppConfig) -> Result<SessionStore> {
    let path = cfg.session_path()?;
    debug!(path = %path.display(), "Using session file");
    Ok(SessionStore::new(Arc::new(FileKeyValueStore::new(path))))
}

pub fn build_service(cfg: &AppConfig) -> Result<NotificationService> {
    let session = open_session(cfg)?;
    let backend = HttpBookingBackend::new(
        &cfg.api.base_url,
        Duration::from_secs(cfg.api.request_timeout_secs),
        session.clone(),
    )
    .context("Invalid API configuration")?;

    NotificationService::new(
        cfg.polling_config(),
        Arc::new(backend),
        session,
        Arc::new(ConsolePresenter),
        Arc::new(ConsoleNavigator),
    )
    .context("Invalid polling configuration")
}
