//! Capability checks.
//!
//! Every protected operation names the [`Action`] it performs and asks
//! [`authorize`] whether the authenticated [`Caller`] may perform it.

use uuid::Uuid;

use crate::models::user::User;

/// The authenticated identity attached to a request by the bearer middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Submit a loan in the name of the given user.
    ApplyForLoan(Uuid),
    /// Read the loan history of the given user.
    ViewLoans(Uuid),
    /// List flagged loans and change loan statuses.
    ReviewLoans,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AccessDenied {
    pub message: &'static str,
}

pub fn authorize(caller: &Caller, action: Action) -> Result<(), AccessDenied> {
    match action {
        Action::ApplyForLoan(owner) if owner != caller.id => Err(AccessDenied {
            message: "You can only apply for a loan on your own behalf.",
        }),
        Action::ViewLoans(owner) if owner != caller.id => Err(AccessDenied {
            message: "You can only view your own loans.",
        }),
        Action::ReviewLoans if !caller.is_staff => Err(AccessDenied {
            message: "You do not have permission to perform this action.",
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(is_staff: bool) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            is_staff,
            is_superuser: false,
        }
    }

    #[test]
    fn test_self_only_actions() {
        let me = caller(false);
        assert!(authorize(&me, Action::ApplyForLoan(me.id)).is_ok());
        assert!(authorize(&me, Action::ViewLoans(me.id)).is_ok());

        let other = Uuid::new_v4();
        let denied = authorize(&me, Action::ApplyForLoan(other)).unwrap_err();
        assert_eq!(
            denied.message,
            "You can only apply for a loan on your own behalf."
        );
        let denied = authorize(&me, Action::ViewLoans(other)).unwrap_err();
        assert_eq!(denied.message, "You can only view your own loans.");
    }

    #[test]
    fn test_staff_is_not_an_impersonation_capability() {
        let admin = caller(true);
        assert!(authorize(&admin, Action::ApplyForLoan(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_review_requires_staff() {
        assert!(authorize(&caller(true), Action::ReviewLoans).is_ok());
        assert!(authorize(&caller(false), Action::ReviewLoans).is_err());
    }
}
