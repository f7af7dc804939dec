use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub const ALL: &'static [$name] = &[$(Self::$variant),+];
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(UserRole {
    Admin => "admin",
    Pm => "pm",
    Ra => "ra",
    Finance => "finance",
});

str_enum!(ProjectStatus {
    Active => "active",
    OnHold => "on_hold",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(ProjectExpertStatus {
    Assigned => "assigned",
    Invited => "invited",
    Accepted => "accepted",
    Declined => "declined",
    ClientSelected => "client_selected",
    Scheduled => "scheduled",
    Completed => "completed",
});

str_enum!(InvitationStatus {
    NotInvited => "not_invited",
    Invited => "invited",
    Opened => "opened",
    Accepted => "accepted",
    Declined => "declined",
});

str_enum!(PipelineStatus {
    Interested => "interested",
    Shortlisted => "shortlisted",
    Accepted => "accepted",
    Declined => "declined",
    Completed => "completed",
});

str_enum!(InviteType {
    General => "general",
    Ra => "ra",
    Existing => "existing",
});

str_enum!(CallStatus {
    Pending => "pending",
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

str_enum!(ActivityType {
    ExpertAssigned => "expert_assigned",
    ExpertInvited => "expert_invited",
    InvitationOpened => "invitation_opened",
    ExpertAccepted => "expert_accepted",
    ExpertDeclined => "expert_declined",
    ExpertShortlisted => "expert_shortlisted",
    ClientSelected => "client_selected",
    CallScheduled => "call_scheduled",
    CallCompleted => "call_completed",
    CallCancelled => "call_cancelled",
    ExpertRemoved => "expert_removed",
    StatusChanged => "status_changed",
});

/// Invite decision submitted from a public invitation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}
