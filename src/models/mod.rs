pub mod activity;
pub mod call_record;
pub mod client;
pub mod enums;
pub mod expert;
pub mod filters;
pub mod invitation_link;
pub mod project;
pub mod project_expert;
pub mod usage_record;
pub mod user;
pub mod validation;
pub mod vetting_question;

pub use activity::*;
pub use call_record::*;
pub use client::*;
pub use enums::*;
pub use expert::*;
pub use filters::*;
pub use invitation_link::*;
pub use project::*;
pub use project_expert::*;
pub use usage_record::*;
pub use user::*;
pub use validation::{Validate, ValidationError};
pub use vetting_question::*;
