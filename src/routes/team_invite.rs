use actix_web::{delete, post, put, web, HttpResponse};

use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{ConfirmationResponse, KeyRequest, TeamInviteRequest};
use crate::routes::validated;
use crate::services::ConfirmationService;

/// POST /api/send/team/invite - inviter un soignant dans une équipe médicale
#[post("/send/team/invite")]
pub async fn send_team_invite(
    auth_user: AuthUser,
    body: web::Json<TeamInviteRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let invite = service.send_team_invite(&auth_user, &body).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

/// PUT /api/send/team/invite - notifier un nouveau admin
#[put("/send/team/invite")]
pub async fn grant_team_admin(
    auth_user: AuthUser,
    body: web::Json<TeamInviteRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let notice = service.grant_team_admin(&auth_user, &body).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&notice)))
}

/// DELETE /api/send/team/invite - notifier le retrait d'un membre
#[delete("/send/team/invite")]
pub async fn remove_team_member(
    auth_user: AuthUser,
    body: web::Json<TeamInviteRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let notice = service.remove_team_member(&auth_user, &body).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&notice)))
}

/// PUT /api/accept/team/invite
#[put("/accept/team/invite")]
pub async fn accept_team_invite(
    auth_user: AuthUser,
    body: web::Json<KeyRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let invite = service.accept_team_invite(&auth_user, &body.key).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

/// PUT /api/dismiss/team/invite/{teamid}
#[put("/dismiss/team/invite/{teamid}")]
pub async fn dismiss_team_invite(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<KeyRequest>,
    service: web::Data<ConfirmationService>,
) -> Result<HttpResponse, ServiceError> {
    validated(&*body)?;
    let invite = service
        .dismiss_team_invite(&auth_user, &path, &body.key)
        .await?;
    Ok(HttpResponse::Ok().json(ConfirmationResponse::from(&invite)))
}

pub fn team_invite_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(send_team_invite)
        .service(grant_team_admin)
        .service(remove_team_member)
        .service(accept_team_invite)
        .service(dismiss_team_invite);
}
