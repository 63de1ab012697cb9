use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use tracing::error;

use crate::models::health::HealthResponse;
use crate::services::ConfirmationService;

/// GET /api/health - état du service et du store
#[get("/health")]
pub async fn health_check(service: web::Data<ConfirmationService>) -> HttpResponse {
    let store = service.store();

    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ok".to_string(),
            store: store.name().to_string(),
            time: Utc::now(),
        }),
        Err(e) => {
            error!("❌ Store {} unavailable: {}", store.name(), e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unavailable".to_string(),
                store: store.name().to_string(),
                time: Utc::now(),
            })
        }
    }
}
