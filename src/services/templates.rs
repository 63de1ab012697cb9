// Rendu minimal des emails: sujet + corps par template, en anglais et en français.
// Les {{Nom}} sont remplacés par le contenu fourni par le workflow.

use std::collections::BTreeMap;

use crate::models::confirmation::TemplateName;

pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "fr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Contenu injecté dans le template ({{Key}}, {{Email}}, ...)
pub type EmailContent = BTreeMap<&'static str, String>;

/// "fr-FR" -> "fr"; langue non supportée -> None
pub fn normalize_language(language: &str) -> Option<&'static str> {
    let primary = language.trim().split(['-', '_']).next()?.to_ascii_lowercase();
    SUPPORTED_LANGUAGES.into_iter().find(|l| *l == primary)
}

fn texts(template: TemplateName, language: &str) -> (&'static str, &'static str) {
    match (template, language) {
        (TemplateName::PasswordReset, "fr") => (
            "Réinitialisation de votre mot de passe",
            "<p>Bonjour,</p><p>Une demande de réinitialisation du mot de passe a été faite pour {{Email}}.</p>\
             <p>Clé de réinitialisation : {{Key}}</p>",
        ),
        (TemplateName::PasswordReset, _) => (
            "Password reset",
            "<p>Hello,</p><p>A password reset was requested for {{Email}}.</p>\
             <p>Reset key: {{Key}}</p>",
        ),
        (TemplateName::PatientPasswordReset, "fr") => (
            "Réinitialisation de votre mot de passe",
            "<p>Bonjour,</p><p>Saisissez ce code sur votre terminal : {{ShortKey}}</p>",
        ),
        (TemplateName::PatientPasswordReset, _) => (
            "Password reset",
            "<p>Hello,</p><p>Enter this code on your handset: {{ShortKey}}</p>",
        ),
        (TemplateName::PatientPinReset, "fr") => (
            "Réinitialisation de votre code PIN",
            "<p>Bonjour,</p><p>Votre code de réinitialisation : {{OTP}}</p>\
             <p>Support : {{SupportEmail}}</p>",
        ),
        (TemplateName::PatientPinReset, _) => (
            "PIN reset",
            "<p>Hello,</p><p>Your reset code: {{OTP}}</p><p>Support: {{SupportEmail}}</p>",
        ),
        (TemplateName::NoAccount, "fr") => (
            "Demande de réinitialisation",
            "<p>Bonjour,</p><p>Aucun compte ne correspond à {{Email}}.</p>",
        ),
        (TemplateName::NoAccount, _) => (
            "Password reset request",
            "<p>Hello,</p><p>No account matches {{Email}}.</p>",
        ),
        (TemplateName::CareteamInvite, "fr") => (
            "Invitation à rejoindre une équipe de soin",
            "<p>Bonjour,</p><p>{{PatientName}} vous invite à suivre ses données.</p>\
             <p>Rendez-vous sur {{WebPath}} avec la clé {{Key}}</p>",
        ),
        (TemplateName::CareteamInvite, _) => (
            "Invitation to join a care team",
            "<p>Hello,</p><p>{{PatientName}} invites you to follow their data.</p>\
             <p>Go to {{WebPath}} with the key {{Key}}</p>",
        ),
        (TemplateName::MedicalteamInvite, "fr") => (
            "Invitation à rejoindre une équipe médicale",
            "<p>Bonjour,</p><p>{{CreatorName}} vous invite dans l'équipe {{MedicalteamName}}.</p>\
             <p>Rendez-vous sur {{WebPath}} avec la clé {{Key}}</p>",
        ),
        (TemplateName::MedicalteamInvite, _) => (
            "Invitation to join a medical team",
            "<p>Hello,</p><p>{{CreatorName}} invites you to join the team {{MedicalteamName}}.</p>\
             <p>Go to {{WebPath}} with the key {{Key}}</p>",
        ),
        (TemplateName::MedicalteamDoAdmin, "fr") => (
            "Vous êtes administrateur",
            "<p>Bonjour,</p><p>Vous êtes maintenant administrateur de l'équipe {{MedicalteamName}}.</p>",
        ),
        (TemplateName::MedicalteamDoAdmin, _) => (
            "You are now an administrator",
            "<p>Hello,</p><p>You are now an administrator of the team {{MedicalteamName}}.</p>",
        ),
        (TemplateName::MedicalteamRemove, "fr") => (
            "Retrait d'une équipe médicale",
            "<p>Bonjour,</p><p>Vous avez été retiré de l'équipe {{MedicalteamName}}.</p>",
        ),
        (TemplateName::MedicalteamRemove, _) => (
            "Removed from a medical team",
            "<p>Hello,</p><p>You have been removed from the team {{MedicalteamName}}.</p>",
        ),
    }
}

fn fill(text: &str, content: &EmailContent) -> String {
    content.iter().fold(text.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{{{}}}}}", name), value)
    })
}

/// Langue non supportée -> anglais
pub fn render(template: TemplateName, language: &str, content: &EmailContent) -> RenderedEmail {
    let language = normalize_language(language).unwrap_or("en");
    let (subject, body) = texts(template, language);

    RenderedEmail { subject: fill(subject, content), body: fill(body, content) }
}
