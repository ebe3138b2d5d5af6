#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ritmofit_notifications::{
    BookingBackend, ClassId, LocalNotification, NavigationTarget, Navigator, NotificationError,
    NotificationPresenter, NotificationRecord, ReservationSnapshot, UserId,
};
use serde_json::json;
use tokio::sync::mpsc;

pub enum Lookup {
    Found(ReservationSnapshot),
    Empty,
    Fail,
}

/// Scriptable backend counting every call
pub struct FakeBackend {
    pub generate_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub fail_generate: AtomicUsize,
    pub fail_fetch: AtomicUsize,
    pub pending: Mutex<Vec<NotificationRecord>>,
    pub fetched_for: Mutex<Vec<UserId>>,
    pub lookup: Mutex<Lookup>,
    pub tokens: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            generate_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            fail_generate: AtomicUsize::new(0),
            fail_fetch: AtomicUsize::new(0),
            pending: Mutex::new(Vec::new()),
            fetched_for: Mutex::new(Vec::new()),
            lookup: Mutex::new(Lookup::Empty),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pending(records: Vec<NotificationRecord>) -> Self {
        let backend = Self::new();
        *backend.pending.lock().unwrap() = records;
        backend
    }

    pub fn set_lookup(&self, lookup: Lookup) {
        *self.lookup.lock().unwrap() = lookup;
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl BookingBackend for FakeBackend {
    async fn generate_notifications(&self) -> Result<(), NotificationError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_generate) {
            return Err(NotificationError::Network("connection refused".into()));
        }
        Ok(())
    }

    async fn pending_notifications(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<NotificationRecord>, NotificationError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_fetch) {
            return Err(NotificationError::Timeout("pending".into()));
        }
        self.fetched_for.lock().unwrap().push(user_id.clone());
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn reservation_for_class(
        &self,
        _user_id: &UserId,
        _clase_id: &ClassId,
    ) -> Result<Option<ReservationSnapshot>, NotificationError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        match &*self.lookup.lock().unwrap() {
            Lookup::Found(reserva) => Ok(Some(reserva.clone())),
            Lookup::Empty => Ok(None),
            Lookup::Fail => Err(NotificationError::Network("unreachable".into())),
        }
    }

    async fn save_push_token(&self, token: &str) -> Result<(), NotificationError> {
        self.tokens.lock().unwrap().push(token.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub shown: Mutex<Vec<LocalNotification>>,
    pub fail_next: AtomicUsize,
}

impl RecordingPresenter {
    pub fn bodies(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.body.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationPresenter for RecordingPresenter {
    async fn schedule(&self, notification: &LocalNotification) -> Result<(), NotificationError> {
        if take_failure(&self.fail_next) {
            return Err(NotificationError::Presenter("permission denied".into()));
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Navigator forwarding every target to a channel
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<NavigationTarget>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationTarget>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Navigator for ChannelNavigator {
    async fn navigate(&self, target: NavigationTarget) -> Result<(), NotificationError> {
        self.tx
            .send(target)
            .map_err(|e| NotificationError::Navigation(e.to_string()))
    }
}

pub fn record(id: serde_json::Value, mensaje: &str) -> NotificationRecord {
    serde_json::from_value(json!({
        "id": id,
        "tipo": "RECORDATORIO",
        "mensaje": mensaje,
        "claseId": 42
    }))
    .unwrap()
}

pub fn reservation(id: i64, estado: &str) -> ReservationSnapshot {
    serde_json::from_value(json!({"id": id, "estado": estado})).unwrap()
}
