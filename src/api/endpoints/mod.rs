//! API endpoint handlers, one module per resource.
//!
//! Handlers open a connection per request, check the caller's page access
//! and hand off to the repository or workflow layer.

pub mod analytics;
pub mod auth;
pub mod calls;
pub mod clients;
pub mod experts;
pub mod health;
pub mod incentives;
pub mod invitation_links;
pub mod invites;
pub mod project_experts;
pub mod projects;
pub mod usage;
pub mod users;
pub mod vetting;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path id, rejecting malformed values with 400.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {raw}")))
}

/// Response for DELETE and other bodiless actions.
#[derive(Debug, serde::Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn done() -> axum::Json<Self> {
        axum::Json(Self { ok: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(parse_id("not-a-uuid"), Err(ApiError::BadRequest(_))));
    }
}
