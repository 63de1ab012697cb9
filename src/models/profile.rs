// Données venant des services externes (identité, profils)
use serde::{Deserialize, Serialize};

/// Instantané dénormalisé de l'auteur d'une confirmation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_other_person: bool,
}

impl Profile {
    /// Nom affiché dans les emails: celui du patient si le compte est tenu
    /// pour une autre personne
    pub fn display_name(&self) -> &str {
        match &self.patient {
            Some(PatientProfile { is_other_person: true, full_name: Some(name) }) => name,
            _ => &self.full_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub display_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserIdentity {
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }

    /// Compte professionnel de santé
    pub fn is_clinic(&self) -> bool {
        self.roles.iter().any(|r| r == "hcp" || r == "clinic")
    }

    pub fn is_patient(&self) -> bool {
        self.roles.iter().any(|r| r == "patient")
    }
}
