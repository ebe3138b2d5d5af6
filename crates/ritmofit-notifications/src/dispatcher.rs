use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapters::NotificationPresenter;
use crate::dedup::DedupCache;
use crate::error::NotificationError;
use crate::types::{
    DispatchOutcome, LocalNotification, NotificationPayload, NotificationPriority,
    NotificationRecord, SkipReason,
};

pub const REMINDER_TITLE: &str = "⏰ Recordatorio de clase";
pub const UPDATE_TITLE: &str = "⚠ Actualización de clase";

/// Turns backend records into local notifications, at most once per id
pub struct NotificationDispatcher {
    presenter: Arc<dyn NotificationPresenter>,
    delivered: Arc<DedupCache>,
    /// Held across check, schedule and mark so overlapping cycles
    /// cannot both treat the same id as new
    gate: Mutex<()>,
}

impl NotificationDispatcher {
    pub fn new(presenter: Arc<dyn NotificationPresenter>, delivered: Arc<DedupCache>) -> Self {
        Self {
            presenter,
            delivered,
            gate: Mutex::new(()),
        }
    }

    pub fn delivered(&self) -> &DedupCache {
        &self.delivered
    }

    /// Present `record` unless it has no id or was already delivered.
    ///
    /// The id is marked delivered only after the presenter accepted the
    /// notification; a presenter error leaves it eligible for a later cycle
    /// and is returned to the caller.
    pub async fn dispatch(
        &self,
        record: &NotificationRecord,
    ) -> Result<DispatchOutcome, NotificationError> {
        let Some(id) = record.id.as_ref() else {
            warn!(
                clase_id = ?record.clase_id,
                "Dropping notification without id"
            );
            return Ok(DispatchOutcome::Skipped(SkipReason::MissingId));
        };

        let _gate = self.gate.lock().await;

        if self.delivered.has_been_delivered(id) {
            debug!(notification_id = %id, "Notification already delivered");
            return Ok(DispatchOutcome::Skipped(SkipReason::Duplicate));
        }

        let notification = build_local_notification(record);
        self.presenter.schedule(&notification).await?;
        self.delivered.mark_delivered(id);

        info!(
            notification_id = %id,
            title = %notification.title,
            "Local notification scheduled"
        );
        Ok(DispatchOutcome::Delivered)
    }
}

pub fn build_local_notification(record: &NotificationRecord) -> LocalNotification {
    let title = if record.is_reminder() {
        REMINDER_TITLE
    } else {
        UPDATE_TITLE
    };

    LocalNotification {
        title: title.to_string(),
        body: record.mensaje.clone().unwrap_or_default(),
        payload: NotificationPayload {
            clase_id: record.clase_id.clone(),
            reserva: record.reserva.clone(),
        },
        sound: true,
        priority: NotificationPriority::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identifier;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingPresenter {
        shown: StdMutex<Vec<LocalNotification>>,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl NotificationPresenter for RecordingPresenter {
        async fn schedule(
            &self,
            notification: &LocalNotification,
        ) -> Result<(), NotificationError> {
            tokio::task::yield_now().await;
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(NotificationError::Presenter("surface unavailable".into()));
            }
            self.shown.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn record(value: serde_json::Value) -> NotificationRecord {
        serde_json::from_value(value).unwrap()
    }

    fn dispatcher(presenter: Arc<RecordingPresenter>) -> NotificationDispatcher {
        NotificationDispatcher::new(presenter, Arc::new(DedupCache::default()))
    }

    #[test]
    fn test_reminder_title_and_payload() {
        let notification = build_local_notification(&record(json!({
            "id": 1,
            "tipo": "RECORDATORIO",
            "mensaje": "Tu clase de yoga empieza pronto",
            "claseId": 42,
            "reserva": {"id": 7, "estado": "confirmada"}
        })));

        assert_eq!(notification.title, REMINDER_TITLE);
        assert_eq!(notification.body, "Tu clase de yoga empieza pronto");
        assert_eq!(notification.payload.clase_id, Some(Identifier::Number(42)));
        assert_eq!(
            notification.payload.reserva.and_then(|r| r.estado).as_deref(),
            Some("confirmada")
        );
        assert!(notification.sound);
        assert_eq!(notification.priority, NotificationPriority::High);
    }

    #[test]
    fn test_other_kinds_use_update_title() {
        let notification = build_local_notification(&record(json!({
            "id": 2,
            "tipo": "CAMBIO_HORARIO",
            "mensaje": "Nueva hora"
        })));
        assert_eq!(notification.title, UPDATE_TITLE);

        let untyped = build_local_notification(&record(json!({"id": 3, "mensaje": "x"})));
        assert_eq!(untyped.title, UPDATE_TITLE);
    }

    #[tokio::test]
    async fn test_same_id_is_delivered_once() {
        let presenter = Arc::new(RecordingPresenter::default());
        let dispatcher = dispatcher(presenter.clone());
        let first = record(json!({"id": "n1", "tipo": "RECORDATORIO", "mensaje": "a"}));
        let second = record(json!({"id": "n1", "tipo": "RECORDATORIO", "mensaje": "b"}));

        assert_eq!(
            dispatcher.dispatch(&first).await.unwrap(),
            DispatchOutcome::Delivered
        );
        assert_eq!(
            dispatcher.dispatch(&second).await.unwrap(),
            DispatchOutcome::Skipped(SkipReason::Duplicate)
        );
        assert_eq!(presenter.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_dispatches_deliver_once() {
        let presenter = Arc::new(RecordingPresenter::default());
        let dispatcher = dispatcher(presenter.clone());
        let rec = record(json!({"id": "n1", "mensaje": "a"}));

        let (a, b) = tokio::join!(dispatcher.dispatch(&rec), dispatcher.dispatch(&rec));

        let mut outcomes = vec![a.unwrap(), b.unwrap()];
        outcomes.sort_by_key(|o| matches!(o, DispatchOutcome::Skipped(_)));
        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::Delivered,
                DispatchOutcome::Skipped(SkipReason::Duplicate)
            ]
        );
        assert_eq!(presenter.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_id_is_never_presented() {
        let presenter = Arc::new(RecordingPresenter::default());
        let dispatcher = dispatcher(presenter.clone());

        let outcome = dispatcher
            .dispatch(&record(json!({"id": null, "tipo": "RECORDATORIO", "mensaje": "x"})))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::MissingId));
        assert!(presenter.shown.lock().unwrap().is_empty());
        assert!(dispatcher.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_presenter_failure_keeps_id_eligible() {
        let presenter = Arc::new(RecordingPresenter::default());
        presenter.failures_left.store(1, Ordering::SeqCst);
        let dispatcher = dispatcher(presenter.clone());
        let rec = record(json!({"id": 9, "mensaje": "retry me"}));

        assert!(matches!(
            dispatcher.dispatch(&rec).await,
            Err(NotificationError::Presenter(_))
        ));
        assert!(!dispatcher.delivered().has_been_delivered(&Identifier::Number(9)));

        assert_eq!(
            dispatcher.dispatch(&rec).await.unwrap(),
            DispatchOutcome::Delivered
        );
        assert_eq!(presenter.shown.lock().unwrap().len(), 1);
    }
}
