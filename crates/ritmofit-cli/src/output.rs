use anyhow::Result;
use colored::Colorize;
use ritmofit_notifications::{CycleReport, NotificationRecord};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_batch(records: &[NotificationRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(records),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No pending notifications.");
                return Ok(());
            }
            println!("{}", batch_table(records));
            println!("Total: {}", records.len());
            Ok(())
        }
    }
}

pub fn print_report(report: &CycleReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            println!(
                "{} user {}: fetched {}, delivered {}, skipped {}, failed {}",
                "Cycle".cyan(),
                report.user_id,
                report.fetched,
                report.delivered,
                report.skipped,
                report.failed
            );
            Ok(())
        }
    }
}

fn batch_table(records: &[NotificationRecord]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Tipo", "Clase", "Mensaje"]);
    for record in records {
        let id = display_or_dash(record.id.as_ref());
        let tipo = record
            .tipo
            .clone()
            .map_or_else(|| "-".to_string(), String::from);
        let clase = display_or_dash(record.clase_id.as_ref());
        let mensaje = record.mensaje.as_deref().unwrap_or("-").to_string();
        builder.push_record([id, tipo, clase, mensaje]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn display_or_dash<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_table_shows_missing_fields_as_dash() {
        let records: Vec<NotificationRecord> = serde_json::from_value(json!([
            {"id": 1, "tipo": "RECORDATORIO", "mensaje": "Spinning 18:00", "claseId": 42},
            {"mensaje": "sin id"}
        ]))
        .unwrap();

        let table = batch_table(&records);
        assert!(table.contains("RECORDATORIO"));
        assert!(table.contains("Spinning 18:00"));
        assert!(table.contains("sin id"));
        assert!(table.contains('-'));
    }
}
