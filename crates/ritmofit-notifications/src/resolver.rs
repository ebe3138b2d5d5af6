use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::BookingBackend;
use crate::session::SessionStore;
use crate::types::{ClassId, NavigationTarget, ReservationSnapshot};

/// Decides where a tapped notification lands.
///
/// Resolution never fails: every lookup problem falls back to the generic
/// class detail so navigation is never blocked.
pub struct DeepLinkResolver {
    backend: Arc<dyn BookingBackend>,
    session: SessionStore,
}

impl DeepLinkResolver {
    pub fn new(backend: Arc<dyn BookingBackend>, session: SessionStore) -> Self {
        Self { backend, session }
    }

    /// Resolve a class id, using `carried` when the notification already
    /// embedded the reservation. A carried reservation is trusted as is.
    pub async fn resolve(
        &self,
        clase_id: &ClassId,
        carried: Option<ReservationSnapshot>,
    ) -> NavigationTarget {
        if let Some(reserva) = carried {
            return NavigationTarget::DetalleReserva {
                reserva,
                clase_id: clase_id.clone(),
            };
        }

        let user_id = match self.session.user_id().await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                debug!(clase_id = %clase_id, "No signed-in user, opening class detail");
                return NavigationTarget::class_detail(clase_id.clone());
            }
            Err(e) => {
                warn!(clase_id = %clase_id, error = %e, "Could not read stored user");
                return NavigationTarget::class_detail(clase_id.clone());
            }
        };

        match self.backend.reservation_for_class(&user_id, clase_id).await {
            Ok(Some(reserva)) => NavigationTarget::DetalleReserva {
                reserva,
                clase_id: clase_id.clone(),
            },
            Ok(None) => {
                debug!(clase_id = %clase_id, user_id = %user_id, "No reservation for class");
                NavigationTarget::class_detail(clase_id.clone())
            }
            Err(e) => {
                warn!(
                    clase_id = %clase_id,
                    user_id = %user_id,
                    error = %e,
                    "Reservation lookup failed, opening class detail"
                );
                NavigationTarget::class_detail(clase_id.clone())
            }
        }
    }
}
