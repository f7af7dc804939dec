use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOrganization {
    pub id: Uuid,
    pub name: String,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClientOrganization {
    pub name: String,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

impl Validate for NewClientOrganization {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, 200)?;
        optional_text("industry", self.industry.as_deref(), 120)?;
        optional_text("country", self.country.as_deref(), 80)?;
        optional_text("notes", self.notes.as_deref(), 4000)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOrganizationUpdate {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

impl Validate for ClientOrganizationUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, 200)?;
        }
        optional_text("industry", self.industry.as_deref(), 120)?;
        optional_text("country", self.country.as_deref(), 80)?;
        optional_text("notes", self.notes.as_deref(), 4000)
    }
}

/// Point of contact at a client organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPoc {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClientPoc {
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
}

impl Validate for NewClientPoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, 120)?;
        optional_email("email", self.email.as_deref())?;
        optional_text("phone", self.phone.as_deref(), 40)?;
        optional_text("jobTitle", self.job_title.as_deref(), 120)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPocUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
}

impl Validate for ClientPocUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, 120)?;
        }
        optional_email("email", self.email.as_deref())?;
        optional_text("phone", self.phone.as_deref(), 40)?;
        optional_text("jobTitle", self.job_title.as_deref(), 120)
    }
}
