use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::UserRole;
use super::validation::*;

/// Internal employee account. Password material never leaves the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub password: String,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        require_email("email", &self.email)?;
        require_text("name", &self.name, 120)?;
        password_strength("password", &self.password)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, 120)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl Validate for PasswordChange {
    fn validate(&self) -> Result<(), ValidationError> {
        password_strength("newPassword", &self.new_password)?;
        if self.current_password == self.new_password {
            return Err(ValidationError::new(
                "newPassword",
                "must differ from the current password",
            ));
        }
        Ok(())
    }
}
