//! REST API.
//!
//! Routes are nested under `/api/`. Staff routes run behind a middleware
//! stack (Rate Limit → Auth → Audit → Handler); the public invitation
//! pages are rate limited per token.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer};
pub use types::ApiContext;
