// Envoi des emails. Un transport par implémentation, choisi au démarrage (NOTIFIER).
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::MailSettings;

/// Résultat d'un envoi: code de type HTTP + message du transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub status: u16,
    pub message: String,
}

impl SendOutcome {
    pub fn ok() -> Self {
        Self { status: 200, message: "OK".to_string() }
    }

    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> SendOutcome;
}

/// Aucun envoi: journalise et répond 200
pub struct NullNotifier;

impl NullNotifier {
    pub fn new() -> Self {
        info!("📭 Mail functionality is disabled, no e-mail will be sent");
        NullNotifier
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn send(&self, recipients: &[String], subject: &str, _body: &str) -> SendOutcome {
        info!(
            "📭 Not sending mail [{}] to {}, disabled by server configuration",
            subject,
            recipients.join(", ")
        );
        SendOutcome::ok()
    }
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// POST JSON vers un relais mail
pub struct HttpMailNotifier {
    client: Client,
    relay_url: String,
    from: String,
    to_domain: Option<String>,
}

impl HttpMailNotifier {
    pub fn new(client: Client, relay_url: &str, mail: &MailSettings) -> Self {
        if let Some(domain) = &mail.to_domain {
            info!("📧 Mail relay configuration: send mail is restricted to {}", domain);
        }
        Self {
            client,
            relay_url: relay_url.to_string(),
            from: mail.from.clone(),
            // "example.org" ou "@example.org": on compare toujours sur "@domaine"
            to_domain: mail
                .to_domain
                .as_deref()
                .map(|domain| format!("@{}", domain.trim_start_matches('@').to_lowercase())),
        }
    }

    /// Destinataires autorisés par la restriction de domaine
    fn allowed_recipients(&self, recipients: &[String]) -> Vec<String> {
        match &self.to_domain {
            None => recipients.to_vec(),
            Some(domain) => recipients
                .iter()
                .filter(|address| {
                    let keep = address.to_lowercase().ends_with(domain.as_str());
                    if !keep {
                        info!("📭 Not sending mail to {}, restricted to {}", address, domain);
                    }
                    keep
                })
                .cloned()
                .collect(),
        }
    }
}

#[async_trait]
impl Notifier for HttpMailNotifier {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> SendOutcome {
        let to = self.allowed_recipients(recipients);
        if to.is_empty() {
            return SendOutcome::ok();
        }

        let message = RelayMessage { from: &self.from, to: &to, subject, html: body };

        match self.client.post(&self.relay_url).json(&message).send().await {
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                if !status.is_success() {
                    error!("❌ Mail relay answered {}: {}", status, text);
                }
                SendOutcome { status: status.as_u16(), message: text }
            }
            Err(e) => {
                error!("❌ Failed to reach mail relay: {}", e);
                SendOutcome::failed(500, e.to_string())
            }
        }
    }
}
