use actix_web::{post, web, HttpResponse};

use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::services::ConfirmationService;

/// POST /api/send/pin_reset/{userid} - PROTÉGÉ (jeton du patient)
/// L'OTP part par email, il n'est jamais renvoyé dans la réponse
#[post("/send/pin_reset/{userid}")]
pub async fn send_pin_reset(
    auth_user: AuthUser,
    path: web::Path<String>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    service.send_pin_reset(&auth_user, &path).await?;
    Ok(HttpResponse::Ok().finish())
}

pub fn pin_reset_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(send_pin_reset);
}
