use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ActivityType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivity {
    pub id: Uuid,
    pub project_id: Uuid,
    pub expert_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub activity_type: ActivityType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectActivity {
    pub fn new(
        project_id: Uuid,
        expert_id: Option<Uuid>,
        actor_id: Option<Uuid>,
        activity_type: ActivityType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            expert_id,
            actor_id,
            activity_type,
            description: description.into(),
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}
