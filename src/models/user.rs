use anyhow::Context;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::users;

/// User data returned from the store (without the password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Everything after the last `@` of the email address.
    #[must_use]
    pub fn email_domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map_or(self.email.as_str(), |(_, domain)| domain)
    }
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .with_context(|| format!("Stored user id is not a UUID: {}", model.id))?;

        Ok(Self {
            id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            is_active: model.is_active,
            is_verified: model.is_verified,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Input for creating an account. The password is hashed by the repository.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            is_active: true,
            is_verified: true,
            is_staff: false,
            is_superuser: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(user("ada@example.com").email_domain(), "example.com");
        assert_eq!(user("odd@name@corp.ng").email_domain(), "corp.ng");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(user("ada@example.com").full_name(), "Ada Obi");
    }
}
