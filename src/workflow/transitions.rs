//! Forward-only status graphs for assignments and calls.
//!
//! Re-asserting the current status is a no-op; any other move not listed
//! here is rejected with `DatabaseError::InvalidTransition`.

use crate::db::DatabaseError;
use crate::models::{CallStatus, InvitationStatus, PipelineStatus, ProjectExpertStatus};

pub trait StatusGraph: Copy + PartialEq + std::fmt::Display + 'static {
    const ENTITY: &'static str;

    fn successors(self) -> &'static [Self];

    fn can_become(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }
}

impl StatusGraph for ProjectExpertStatus {
    const ENTITY: &'static str = "project expert status";

    fn successors(self) -> &'static [Self] {
        use ProjectExpertStatus::*;
        match self {
            Assigned => &[Invited, Accepted, Declined],
            Invited => &[Accepted, Declined],
            Accepted => &[ClientSelected, Scheduled],
            ClientSelected => &[Scheduled, Completed],
            Scheduled => &[Completed],
            Declined | Completed => &[],
        }
    }
}

impl StatusGraph for InvitationStatus {
    const ENTITY: &'static str = "invitation status";

    fn successors(self) -> &'static [Self] {
        use InvitationStatus::*;
        match self {
            NotInvited => &[Invited, Opened, Accepted, Declined],
            Invited => &[Opened, Accepted, Declined],
            Opened => &[Accepted, Declined],
            Accepted | Declined => &[],
        }
    }
}

impl StatusGraph for PipelineStatus {
    const ENTITY: &'static str = "pipeline status";

    fn successors(self) -> &'static [Self] {
        use PipelineStatus::*;
        match self {
            Interested => &[Shortlisted, Accepted, Declined],
            Shortlisted => &[Accepted, Declined],
            Accepted => &[Completed],
            Declined | Completed => &[],
        }
    }
}

impl StatusGraph for CallStatus {
    const ENTITY: &'static str = "call status";

    fn successors(self) -> &'static [Self] {
        use CallStatus::*;
        match self {
            Pending => &[Scheduled, Cancelled],
            Scheduled => &[Completed, Cancelled, NoShow],
            Completed | Cancelled | NoShow => &[],
        }
    }
}

/// Validate a single move in a status graph.
pub fn ensure_transition<S: StatusGraph>(from: S, to: S) -> Result<(), DatabaseError> {
    if from.can_become(to) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidTransition {
            entity: S::ENTITY,
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Pipeline status starts unset; an expert enters as interested, shortlisted
/// or declined.
pub fn ensure_pipeline_transition(
    from: Option<PipelineStatus>,
    to: PipelineStatus,
) -> Result<(), DatabaseError> {
    match from {
        Some(current) => ensure_transition(current, to),
        None if matches!(
            to,
            PipelineStatus::Interested | PipelineStatus::Shortlisted | PipelineStatus::Declined
        ) =>
        {
            Ok(())
        }
        None => Err(DatabaseError::InvalidTransition {
            entity: PipelineStatus::ENTITY,
            from: "none".into(),
            to: to.to_string(),
        }),
    }
}
