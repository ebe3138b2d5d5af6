use anyhow::{Context, Result};
use colored::Colorize;
use ritmofit_notifications::{
    Identifier, NotificationPayload, ReservationSnapshot, StartOutcome, StopMode,
};
use tracing::info;

use crate::cli::{OutputFormat, PollArgs, TapArgs};
use crate::config::AppConfig;
use crate::output::{print_batch, print_error, print_json, print_report, print_success};

pub async fn poll(cfg: &AppConfig, args: &PollArgs, format: OutputFormat) -> Result<()> {
    let service = super::build_service(cfg)?;
    let user_id = args.user_id.as_deref().map(Identifier::parse);

    if args.once {
        return match service.poll_once(user_id).await? {
            Some(report) => print_report(&report, format),
            None => {
                print_error("No signed-in user. Run: ritmofit login --user-id <id> --token <token>");
                Ok(())
            }
        };
    }

    service.prime().await;
    match service.start_polling(user_id).await {
        StartOutcome::Started(user) => {
            println!(
                "Polling every {}s for user {} (Ctrl-C to stop)",
                cfg.polling.interval_secs,
                user.to_string().cyan()
            );
        }
        StartOutcome::NoUser => {
            print_error("No signed-in user. Run: ritmofit login --user-id <id> --token <token>");
            return Ok(());
        }
        StartOutcome::AlreadyRunning => {}
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Interrupt received");
    service.stop_polling(StopMode::Transient).await;
    print_success("Polling stopped");
    Ok(())
}

pub async fn tap(cfg: &AppConfig, args: &TapArgs, format: OutputFormat) -> Result<()> {
    let service = super::build_service(cfg)?;
    let reserva = args
        .reserva
        .as_deref()
        .map(serde_json::from_str::<ReservationSnapshot>)
        .transpose()
        .context("--reserva must be a reservation JSON object")?;

    let payload = NotificationPayload {
        clase_id: Some(Identifier::parse(&args.clase_id)),
        reserva,
    };
    if let Some(target) = service.handle_tap(payload).await
        && matches!(format, OutputFormat::Json)
    {
        print_json(&target)?;
    }
    Ok(())
}

pub async fn list(cfg: &AppConfig, format: OutputFormat) -> Result<()> {
    let service = super::build_service(cfg)?;
    print_batch(&service.last_batch().await, format)
}

pub async fn register_token(cfg: &AppConfig, token: &str) -> Result<()> {
    let service = super::build_service(cfg)?;
    if service.register_push_token(token).await {
        print_success("Push token registered");
    } else {
        print_error("Backend did not accept the push token (see logs)");
    }
    Ok(())
}
