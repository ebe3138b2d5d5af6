use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use time::OffsetDateTime;

/// Backend identifier. The booking API mixes numeric and string ids, so both
/// are accepted and kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

pub type NotificationId = Identifier;
pub type ClassId = Identifier;
pub type UserId = Identifier;
pub type ReservationId = Identifier;

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Identifier {
    /// Parses user input: all-digit strings become numbers, anything else text.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.trim().to_string()),
        }
    }
}

/// Notification kind (`tipo` on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    /// Upcoming-class reminder (`RECORDATORIO`)
    Reminder,
    /// Any other class update, kept verbatim
    Other(String),
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        if value == "RECORDATORIO" {
            Self::Reminder
        } else {
            Self::Other(value)
        }
    }
}

impl From<NotificationKind> for String {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::Reminder => "RECORDATORIO".to_string(),
            NotificationKind::Other(s) => s,
        }
    }
}

/// Reservation snapshot as returned by the backend or embedded in a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReservationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clase_id: Option<ClassId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clase: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sede: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,

    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One pending notification from `GET /notificaciones/pending/{usuarioId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NotificationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo: Option<NotificationKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clase_id: Option<ClassId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserva: Option<ReservationSnapshot>,

    /// Remaining backend fields, persisted untouched with the batch
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationRecord {
    pub fn is_reminder(&self) -> bool {
        matches!(self.tipo, Some(NotificationKind::Reminder))
    }
}

/// Data attached to a local notification and handed back on tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default)]
    pub clase_id: Option<ClassId>,

    #[serde(default)]
    pub reserva: Option<ReservationSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Default,
    High,
}

/// A notification ready for the OS presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
    pub sound: bool,
    pub priority: NotificationPriority,
}

/// Where a tapped notification should land
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all_fields = "camelCase")]
pub enum NavigationTarget {
    /// Detail of a reservation the user already holds
    DetalleReserva {
        reserva: ReservationSnapshot,
        clase_id: ClassId,
    },
    /// Generic class detail; `reserva_id` is always empty when produced here
    ClaseDetail {
        clase_id: ClassId,
        reserva_id: Option<ReservationId>,
    },
}

impl NavigationTarget {
    pub fn class_detail(clase_id: ClassId) -> Self {
        Self::ClaseDetail {
            clase_id,
            reserva_id: None,
        }
    }

    pub fn clase_id(&self) -> &ClassId {
        match self {
            Self::DetalleReserva { clase_id, .. } | Self::ClaseDetail { clase_id, .. } => clase_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Record arrived without an `id`; it cannot be deduplicated
    MissingId,
    /// Already delivered in this process
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered,
    Skipped(SkipReason),
}

/// Result of a `start` request on the polling scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(UserId),
    AlreadyRunning,
    /// No explicit user and none stored; nothing to poll for
    NoUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Pause polling; delivered ids are remembered
    Transient,
    /// Session is over; delivered ids are forgotten
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
}

/// Summary of one polling cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub user_id: UserId,
    pub fetched: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
}

impl CycleReport {
    pub(crate) fn new(user_id: UserId, fetched: usize) -> Self {
        Self {
            user_id,
            fetched,
            delivered: 0,
            skipped: 0,
            failed: 0,
            completed_at: OffsetDateTime::now_utc(),
        }
    }
}
