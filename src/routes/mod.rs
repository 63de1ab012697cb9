pub mod forgot;
pub mod health;
pub mod invite;
pub mod pin_reset;
pub mod team_invite;

use actix_web::web;
use tracing::info;
use validator::Validate;

use crate::error::ServiceError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(forgot::forgot_routes)
            .configure(pin_reset::pin_reset_routes)
            .configure(team_invite::team_invite_routes)
            // en dernier: /{userid}/invited/{address} capture tout chemin à 3 segments
            .configure(invite::invite_routes),
    );
}

/// Contrôle du corps de requête avant d'appeler le service
pub(crate) fn validated<T: Validate>(body: &T) -> Result<(), ServiceError> {
    body.validate().map_err(|e| {
        info!("📥 Invalid request body: {}", e);
        ServiceError::bad_request(format!("Invalid request body: {}", e))
    })
}
