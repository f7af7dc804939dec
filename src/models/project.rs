use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ProjectStatus;
use super::validation::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub client_organization_id: Option<Uuid>,
    pub client_poc_id: Option<Uuid>,
    pub pm_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub cu_budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project with its credit consumption, as shown on the detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub cu_consumed: f64,
    pub cu_remaining: Option<f64>,
}

impl ProjectDetail {
    pub fn new(project: Project, cu_consumed: f64) -> Self {
        let cu_remaining = project.cu_budget.map(|budget| budget - cu_consumed);
        Self {
            project,
            cu_consumed,
            cu_remaining,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub client_organization_id: Option<Uuid>,
    pub client_poc_id: Option<Uuid>,
    pub pm_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub cu_budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

fn check_dates(start: Option<NaiveDate>, due: Option<NaiveDate>) -> Result<(), ValidationError> {
    match (start, due) {
        (Some(s), Some(d)) if d < s => Err(ValidationError::new(
            "dueDate",
            "must not be before the start date",
        )),
        _ => Ok(()),
    }
}

impl Validate for NewProject {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, 200)?;
        optional_text("description", self.description.as_deref(), 8000)?;
        non_negative("cuBudget", self.cu_budget)?;
        check_dates(self.start_date, self.due_date)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub client_organization_id: Option<Uuid>,
    pub client_poc_id: Option<Uuid>,
    pub pm_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub cu_budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl Validate for ProjectUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, 200)?;
        }
        optional_text("description", self.description.as_deref(), 8000)?;
        non_negative("cuBudget", self.cu_budget)?;
        check_dates(self.start_date, self.due_date)
    }
}
