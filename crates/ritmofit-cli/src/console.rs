//! Terminal stand-ins for the OS notification surface and the app navigator.

use async_trait::async_trait;
use colored::Colorize;
use ritmofit_notifications::{
    LocalNotification, NavigationTarget, Navigator, NotificationError, NotificationPresenter,
};

pub struct ConsolePresenter;

#[async_trait]
impl NotificationPresenter for ConsolePresenter {
    async fn schedule(&self, notification: &LocalNotification) -> Result<(), NotificationError> {
        println!("{}", notification.title.bold().yellow());
        println!("  {}", notification.body);
        if let Some(clase_id) = &notification.payload.clase_id {
            println!("  {} {}", "clase:".dimmed(), clase_id);
        }
        Ok(())
    }
}

pub struct ConsoleNavigator;

#[async_trait]
impl Navigator for ConsoleNavigator {
    async fn navigate(&self, target: NavigationTarget) -> Result<(), NotificationError> {
        let line = match &target {
            NavigationTarget::DetalleReserva { reserva, clase_id } => format!(
                "DetalleReserva (clase {clase_id}, reserva {})",
                reserva
                    .id
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string)
            ),
            NavigationTarget::ClaseDetail { clase_id, .. } => {
                format!("ClaseDetail (clase {clase_id})")
            }
        };
        println!("{} {}", "→".cyan(), line);
        Ok(())
    }
}
