use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::NotificationError;
use crate::session::SessionStore;
use crate::types::{ClassId, NotificationRecord, ReservationSnapshot, UserId};

/// Booking REST backend, as far as notifications are concerned
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// Ask the server to materialise newly due notifications.
    /// Must complete before a following `pending_notifications` can see them.
    async fn generate_notifications(&self) -> Result<(), NotificationError>;

    /// Pending notifications for a user
    async fn pending_notifications(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<NotificationRecord>, NotificationError>;

    /// The user's reservation for a class, `None` when there is none
    async fn reservation_for_class(
        &self,
        user_id: &UserId,
        clase_id: &ClassId,
    ) -> Result<Option<ReservationSnapshot>, NotificationError>;

    /// Register the device push token for the signed-in user
    async fn save_push_token(&self, token: &str) -> Result<(), NotificationError>;
}

/// `BookingBackend` over HTTP/JSON.
///
/// The bearer token is read from the session on every request, so a login or
/// logout takes effect without rebuilding the client.
pub struct HttpBookingBackend {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl HttpBookingBackend {
    /// `base_url` is the API root, e.g. `http://192.0.168.62:8080/api`
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        session: SessionStore,
    ) -> Result<Self, NotificationError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| NotificationError::InvalidConfig(format!("base_url {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NotificationError::InvalidConfig(format!(
                "base_url must be http(s), got {}",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: parsed,
            session,
        })
    }

    /// Appends `segments` to the base path; each one is percent-encoded, so an
    /// id containing `/`, `?` or `#` stays a single segment.
    fn api_url(&self, segments: &[&str]) -> Result<Url, NotificationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                NotificationError::InvalidConfig(format!(
                    "base_url {} cannot take a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, NotificationError> {
        let mut req = self
            .http
            .request(method, self.api_url(segments)?)
            .header("Accept", "application/json");
        match self.session.token().await {
            Ok(Some(token)) => req = req.bearer_auth(token),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read API token; sending unauthenticated request"),
        }
        Ok(req)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, NotificationError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotificationError::HttpStatus(status.as_u16()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl BookingBackend for HttpBookingBackend {
    async fn generate_notifications(&self) -> Result<(), NotificationError> {
        let req = self
            .request(Method::POST, &["notificaciones", "generar"])
            .await?;
        self.send(req).await?;
        debug!("Notification generation triggered");
        Ok(())
    }

    async fn pending_notifications(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<NotificationRecord>, NotificationError> {
        let user = user_id.to_string();
        let req = self
            .request(Method::GET, &["notificaciones", "pending", user.as_str()])
            .await?;
        let body = self.send(req).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| NotificationError::Decode(e.to_string()))?;
        Ok(decode_records(items))
    }

    async fn reservation_for_class(
        &self,
        user_id: &UserId,
        clase_id: &ClassId,
    ) -> Result<Option<ReservationSnapshot>, NotificationError> {
        let clase = clase_id.to_string();
        let req = self
            .request(Method::GET, &["reservas", "clase", clase.as_str()])
            .await?
            .query(&[("usuarioId", user_id.to_string())]);
        let resp = req.send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Ok(None),
            status if !status.is_success() => {
                return Err(NotificationError::HttpStatus(status.as_u16()));
            }
            _ => {}
        }

        let body = resp.text().await?;
        let body = body.trim();
        if body.is_empty() || body == "null" {
            return Ok(None);
        }
        serde_json::from_str(body)
            .map(Some)
            .map_err(|e| NotificationError::Decode(e.to_string()))
    }

    async fn save_push_token(&self, token: &str) -> Result<(), NotificationError> {
        let req = self
            .request(Method::POST, &["usuarios", "save-token"])
            .await?
            .json(&json!({ "token": token }));
        self.send(req).await?;
        Ok(())
    }
}

/// Decode a pending batch element by element; malformed records are dropped.
fn decode_records(items: Vec<Value>) -> Vec<NotificationRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Dropping malformed notification record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identifier;

    #[test]
    fn test_rejects_invalid_base_url() {
        let session = SessionStore::in_memory();
        assert!(matches!(
            HttpBookingBackend::new("not a url", Duration::from_secs(1), session.clone()),
            Err(NotificationError::InvalidConfig(_))
        ));
        assert!(matches!(
            HttpBookingBackend::new("ftp://example.com/api", Duration::from_secs(1), session),
            Err(NotificationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_api_url_joins_paths() {
        let backend = HttpBookingBackend::new(
            "http://localhost:8080/api/",
            Duration::from_secs(1),
            SessionStore::in_memory(),
        )
        .unwrap();
        assert_eq!(
            backend.api_url(&["notificaciones", "generar"]).unwrap().as_str(),
            "http://localhost:8080/api/notificaciones/generar"
        );
    }

    #[test]
    fn test_api_url_keeps_ids_in_one_segment() {
        let backend = HttpBookingBackend::new(
            "http://localhost/api",
            Duration::from_secs(1),
            SessionStore::in_memory(),
        )
        .unwrap();
        let url = backend
            .api_url(&["notificaciones", "pending", "u/1?x=2#frag"])
            .unwrap();

        assert_eq!(url.path(), "/api/notificaciones/pending/u%2F1%3Fx=2%23frag");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_decode_records_skips_malformed_entries() {
        let records = decode_records(vec![
            json!({"id": 1, "tipo": "RECORDATORIO", "mensaje": "good"}),
            json!({"id": 2.5, "mensaje": "odd id"}),
            json!("not an object"),
            json!({"id": "n3", "mensaje": "also good"}),
        ]);

        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(
            ids,
            vec![Some(Identifier::Number(1)), Some(Identifier::from("n3"))]
        );
    }
}
