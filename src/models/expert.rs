use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
    /// RA credited with recruiting this expert (incentive attribution).
    pub sourced_by_ra_id: Option<Uuid>,
    pub sourced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpert {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub sourced_by_ra_id: Option<Uuid>,
}

fn check_linkedin(url: Option<&str>) -> Result<(), ValidationError> {
    match url {
        Some(u) if !u.is_empty() && !(u.starts_with("https://") || u.starts_with("http://")) => {
            Err(ValidationError::new("linkedinUrl", "must be an http(s) URL"))
        }
        _ => optional_text("linkedinUrl", url, 300),
    }
}

fn check_expertise(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > 30 {
        return Err(ValidationError::new("expertise", "at most 30 tags"));
    }
    if tags.iter().any(|t| t.trim().is_empty() || t.chars().count() > 80) {
        return Err(ValidationError::new(
            "expertise",
            "tags must be non-empty and at most 80 characters",
        ));
    }
    Ok(())
}

impl Validate for NewExpert {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, 160)?;
        optional_email("email", self.email.as_deref())?;
        optional_text("phone", self.phone.as_deref(), 40)?;
        check_linkedin(self.linkedin_url.as_deref())?;
        optional_text("jobTitle", self.job_title.as_deref(), 160)?;
        optional_text("company", self.company.as_deref(), 160)?;
        optional_text("bio", self.bio.as_deref(), 8000)?;
        check_expertise(&self.expertise)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub expertise: Option<Vec<String>>,
}

impl Validate for ExpertUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, 160)?;
        }
        optional_email("email", self.email.as_deref())?;
        optional_text("phone", self.phone.as_deref(), 40)?;
        check_linkedin(self.linkedin_url.as_deref())?;
        optional_text("jobTitle", self.job_title.as_deref(), 160)?;
        optional_text("company", self.company.as_deref(), 160)?;
        optional_text("bio", self.bio.as_deref(), 8000)?;
        match &self.expertise {
            Some(tags) => check_expertise(tags),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linkedin_must_be_url() {
        let expert = NewExpert {
            name: "Marta Reis".into(),
            linkedin_url: Some("linkedin.com/in/marta".into()),
            ..Default::default()
        };
        assert_eq!(expert.validate().unwrap_err().field, "linkedinUrl");
    }

    #[test]
    fn empty_expertise_tag_is_rejected() {
        let expert = NewExpert {
            name: "Marta Reis".into(),
            expertise: vec!["lithium".into(), " ".into()],
            ..Default::default()
        };
        assert_eq!(expert.validate().unwrap_err().field, "expertise");
    }
}
