use actix_web::{post, put, web, HttpRequest, HttpResponse};
use tracing::info;

use crate::error::ServiceError;
use crate::models::dto::{ConfirmationResponse, ResetPasswordRequest};
use crate::routes::validated;
use crate::services::ConfirmationService;

/// Première langue de l'en-tête Accept-Language ("fr-FR,fr;q=0.9" -> "fr-FR")
fn browser_language(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Accept-Language")?.to_str().ok()?;
    header
        .split(',')
        .next()
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

/// POST /api/send/forgot/{email} - PUBLIC
/// Toujours 200 si l'email est parti: ne dit pas si le compte existe
#[post("/send/forgot/{email}")]
pub async fn send_forgot(
    req: HttpRequest,
    path: web::Path<String>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    let email = path.into_inner();
    let language = browser_language(&req);

    service.forgot_password(&email, language.as_deref()).await?;
    info!("📨 Forgot password handled");

    Ok(HttpResponse::Ok().finish())
}

/// PUT /api/accept/forgot - PUBLIC (la clé fait office d'autorisation)
#[put("/accept/forgot")]
pub async fn accept_forgot(
    body: web::Json<ResetPasswordRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;

    let reset = service.accept_password_reset(&body).await?;

    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&reset)))
}

pub fn forgot_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(send_forgot).service(accept_forgot);
}
