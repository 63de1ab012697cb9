use actix_web::{get, post, put, web, HttpResponse};

use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::confirmation::Confirmation;
use crate::models::dto::{ConfirmationResponse, InviteRequest, KeyRequest};
use crate::routes::validated;
use crate::services::ConfirmationService;

fn to_responses(invitations: &[Confirmation]) -> Vec<ConfirmationResponse> {
    invitations.iter().map(ConfirmationResponse::from).collect()
}

/// POST /api/send/invite/{userid} - inviter un soignant dans son équipe de soin
#[post("/send/invite/{userid}")]
pub async fn send_invite(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<InviteRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let invite = service.send_invite(&auth_user, &path, &body).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

/// GET /api/invite/{userid} - invitations envoyées
#[get("/invite/{userid}")]
pub async fn sent_invitations(
    auth_user: AuthUser,
    path: web::Path<String>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    let invitations = service.sent_invitations(&auth_user, &path).await?;
    Ok(HttpResponse::Ok().json(to_responses(&invitations)))
}

/// GET /api/invitations/{userid} - invitations reçues (liste vide possible)
#[get("/invitations/{userid}")]
pub async fn received_invitations(
    auth_user: AuthUser,
    path: web::Path<String>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    let invitations = service.received_invitations(&auth_user, &path).await?;
    Ok(HttpResponse::Ok().json(to_responses(&invitations)))
}

/// PUT /api/accept/invite/{userid}/{invitedby}
#[put("/accept/invite/{userid}/{invitedby}")]
pub async fn accept_invite(
    auth_user: AuthUser,
    path: web::Path<(String, String)>,
    body: web::Json<KeyRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let (invitee_id, invitor_id) = path.into_inner();
    let invite = service
        .accept_invite(&auth_user, &invitee_id, &invitor_id, &body.key)
        .await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

/// PUT /api/dismiss/invite/{userid}/{invitedby}
#[put("/dismiss/invite/{userid}/{invitedby}")]
pub async fn dismiss_invite(
    auth_user: AuthUser,
    path: web::Path<(String, String)>,
    body: web::Json<KeyRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let (invitee_id, invitor_id) = path.into_inner();
    let invite = service
        .dismiss_invite(&auth_user, &invitee_id, &invitor_id, &body.key)
        .await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

/// PUT /api/{userid}/invited/{address} - l'invitant annule son invitation
#[put("/{userid}/invited/{address}")]
pub async fn cancel_invite(
    auth_user: AuthUser,
    path: web::Path<(String, String)>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    let (invitor_id, email) = path.into_inner();
    let invite = service.cancel_invite(&auth_user, &invitor_id, &email).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

pub fn invite_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(send_invite)
        .service(sent_invitations)
        .service(received_invitations)
        .service(accept_invite)
        .service(dismiss_invite)
        .service(cancel_invite);
}
