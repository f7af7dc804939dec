//! Business rules layered over the repository: status graphs, CU pricing,
//! invitation redemption, RA incentives and dashboard aggregates.

pub mod analytics;
pub mod credits;
pub mod incentives;
pub mod invitation;
pub mod pipeline;
pub mod transitions;

pub use analytics::*;
pub use credits::*;
pub use incentives::*;
pub use invitation::*;
pub use pipeline::*;
pub use transitions::*;
