mod clients;
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod store;
mod utils;

#[cfg(test)]
mod testing;

use actix_web::{App, HttpServer, web};
use std::env;
use std::io;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clients::{
    HttpIdentityClient, HttpMailNotifier, HttpPermissionClient, HttpProfileClient, HttpTeamClient,
    Notifier, NullNotifier,
};
use crate::config::{AppConfig, NotifierKind, StoreKind};
use crate::services::ConfirmationService;
use crate::store::{ConfirmationStore, MemoryStore, PostgresStore};
use crate::utils::jwt::JwtVerifier;

/// Logs structurés: RUST_LOG pour le filtre, LOG_FORMAT=json en production
fn init_tracing() {
    let log_level =
        env::var("RUST_LOG").unwrap_or_else(|_| "confirmation_service=info,info".to_string());

    let subscriber = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
    );

    if env::var("LOG_FORMAT").unwrap_or_default() == "json" {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .init();
    }

    info!("✅ Logging initialized with level: {}", log_level);
}

async fn build_store(config: &AppConfig) -> io::Result<Arc<dyn ConfirmationStore>> {
    match (config.store, config.database_url.as_deref()) {
        (StoreKind::Postgres, Some(url)) => {
            info!("🔌 Connecting to database...");
            let db = db::establish_connection(url).await.map_err(io::Error::other)?;
            db::ensure_schema(&db).await.map_err(io::Error::other)?;
            info!("✅ Database connected!");
            Ok(Arc::new(PostgresStore::new(db)))
        }
        (StoreKind::Postgres, None) => Err(io::Error::other("DATABASE_URL must be set")),
        (StoreKind::Memory, _) => {
            info!("🧠 Using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_notifier(config: &AppConfig, client: &reqwest::Client) -> io::Result<Arc<dyn Notifier>> {
    match (config.notifier, config.mail.relay_url.as_deref()) {
        (NotifierKind::Http, Some(relay_url)) => Ok(Arc::new(HttpMailNotifier::new(
            client.clone(),
            relay_url,
            &config.mail,
        ))),
        (NotifierKind::Http, None) => Err(io::Error::other("MAIL_RELAY_URL must be set")),
        (NotifierKind::Null, _) => Ok(Arc::new(NullNotifier::new())),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().map_err(|e| {
        error!("❌ Invalid configuration: {}", e);
        io::Error::other(e)
    })?;

    let store = build_store(&config).await?;
    let client = reqwest::Client::new();
    let notifier = build_notifier(&config, &client)?;
    info!("📦 Store: {}, notifier: {}", store.name(), notifier.name());

    let service = web::Data::new(ConfirmationService::new(
        store,
        notifier,
        Arc::new(HttpIdentityClient::new(client.clone(), &config.identity_url, &config.server_token)),
        Arc::new(HttpPermissionClient::new(client.clone(), &config.identity_url, &config.server_token)),
        Arc::new(HttpTeamClient::new(client.clone(), &config.teams_url, &config.server_token)),
        Arc::new(HttpProfileClient::new(client, &config.profiles_url, &config.server_token)),
        config.service.clone(),
    ));

    let jwt = web::Data::new(JwtVerifier::new(&config.jwt_secret));

    info!("🚀 Starting server on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(jwt.clone())
            .configure(routes::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
