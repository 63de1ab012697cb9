// Chaîne de validation: contrôles indépendants avant d'agir sur une confirmation.
// Chaque contrôle renvoie une violation ou rien; `Expectations::check` les
// enchaîne sans court-circuit et rend la liste ordonnée. L'appelant traite
// toute liste non vide comme "forbidden".

use std::fmt;

use crate::models::confirmation::{Confirmation, ConfirmationType, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Status { expected: Status, actual: Status },
    Type { expected: ConfirmationType, actual: ConfirmationType },
    UserId { expected: String, actual: Option<String> },
    CreatorId { expected: String, actual: Option<String> },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::Status { .. } => "status_mismatch",
            Violation::Type { .. } => "type_mismatch",
            Violation::UserId { .. } => "user_id_mismatch",
            Violation::CreatorId { .. } => "creator_id_mismatch",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Status { expected, actual } => {
                write!(f, "expected status [{}] but was [{}]", expected, actual)
            }
            Violation::Type { expected, actual } => {
                write!(f, "expected type [{}] but was [{}]", expected, actual)
            }
            Violation::UserId { expected, actual } => write!(
                f,
                "expected user id [{}] but was [{}]",
                expected,
                actual.as_deref().unwrap_or("")
            ),
            Violation::CreatorId { expected, actual } => write!(
                f,
                "expected creator id [{}] but was [{}]",
                expected,
                actual.as_deref().unwrap_or("")
            ),
        }
    }
}

pub fn validate_status(confirmation: &Confirmation, expected: Status) -> Option<Violation> {
    (confirmation.status != expected).then(|| Violation::Status {
        expected,
        actual: confirmation.status,
    })
}

pub fn validate_type(confirmation: &Confirmation, expected: ConfirmationType) -> Option<Violation> {
    let actual = confirmation.confirmation_type();
    (actual != expected).then_some(Violation::Type { expected, actual })
}

/// N'a de sens qu'une fois user_id résolu: un user_id vide est une violation
pub fn validate_user_id(confirmation: &Confirmation, expected: &str) -> Option<Violation> {
    (confirmation.user_id.as_deref() != Some(expected)).then(|| Violation::UserId {
        expected: expected.to_string(),
        actual: confirmation.user_id.clone(),
    })
}

pub fn validate_creator_id(confirmation: &Confirmation, expected: &str) -> Option<Violation> {
    (confirmation.creator_id.as_deref() != Some(expected)).then(|| Violation::CreatorId {
        expected: expected.to_string(),
        actual: confirmation.creator_id.clone(),
    })
}

/// Attentes de l'appelant; seuls les contrôles renseignés sont exécutés
#[derive(Debug, Clone, Default)]
pub struct Expectations {
    status: Option<Status>,
    confirmation_type: Option<ConfirmationType>,
    user_id: Option<String>,
    creator_id: Option<String>,
}

impl Expectations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn confirmation_type(mut self, confirmation_type: ConfirmationType) -> Self {
        self.confirmation_type = Some(confirmation_type);
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn creator_id(mut self, creator_id: &str) -> Self {
        self.creator_id = Some(creator_id.to_string());
        self
    }

    /// Toutes les violations, dans l'ordre status, type, user id, creator id
    pub fn check(&self, confirmation: &Confirmation) -> Vec<Violation> {
        [
            self.status.and_then(|s| validate_status(confirmation, s)),
            self.confirmation_type.and_then(|t| validate_type(confirmation, t)),
            self.user_id.as_deref().and_then(|u| validate_user_id(confirmation, u)),
            self.creator_id.as_deref().and_then(|c| validate_creator_id(confirmation, c)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(from: &str, to: &str) -> Confirmation {
        let mut c = Confirmation::new(ConfirmationType::CareteamInvite, Some(from)).unwrap();
        c.user_id = Some(to.to_string());
        c
    }

    #[test]
    fn test_matching_invite_has_no_violation() {
        let c = invite("UID-A", "UID-B");
        let violations = Expectations::new()
            .status(Status::Pending)
            .confirmation_type(ConfirmationType::CareteamInvite)
            .user_id("UID-B")
            .creator_id("UID-A")
            .check(&c);

        assert!(violations.is_empty());
    }

    #[test]
    fn test_all_violations_are_collected_in_order() {
        let mut c = invite("UID-A", "UID-B");
        c.update_status(Status::Declined);

        let violations = Expectations::new()
            .status(Status::Pending)
            .confirmation_type(ConfirmationType::MedicalTeamInvite)
            .user_id("UID-X")
            .creator_id("UID-Y")
            .check(&c);

        let codes: Vec<&str> = violations.iter().map(Violation::code).collect();
        assert_eq!(
            codes,
            vec!["status_mismatch", "type_mismatch", "user_id_mismatch", "creator_id_mismatch"]
        );
    }

    #[test]
    fn test_only_requested_checks_run() {
        let mut c = invite("UID-A", "UID-B");
        c.update_status(Status::Completed);

        let violations = Expectations::new().creator_id("UID-A").check(&c);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_unresolved_user_id_fails() {
        let c = Confirmation::new(ConfirmationType::CareteamInvite, Some("UID-A")).unwrap();
        assert_eq!(
            validate_user_id(&c, "UID-B"),
            Some(Violation::UserId { expected: "UID-B".into(), actual: None })
        );
    }

    #[test]
    fn test_individual_checks() {
        let c = invite("UID-A", "UID-B");
        assert!(validate_status(&c, Status::Pending).is_none());
        assert!(validate_type(&c, ConfirmationType::CareteamInvite).is_none());
        assert!(validate_creator_id(&c, "UID-B").is_some());
        assert_eq!(
            validate_type(&c, ConfirmationType::PinReset).unwrap().to_string(),
            "expected type [pin_reset] but was [careteam_invitation]"
        );
    }
}
