//! Shared types for the API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::authorization::{can_access, Page};
use crate::core_state::CoreState;
use crate::models::{User, UserRole};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    /// Tighter per-token budget for the public invitation pages.
    pub invite_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
            invite_limiter: Arc::new(Mutex::new(RateLimiter::with_limits(20, 120))),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Authenticated user: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Signed-in staff member, injected into request extensions by the auth
/// middleware after the bearer token resolved to a live session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token_hash: String,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    /// Refuse unless the user's role may open `page`.
    pub fn require(&self, page: Page) -> Result<(), ApiError> {
        if can_access(self.user.role, page) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user.id, role = %self.user.role, page = page.path(), "Access denied");
            Err(ApiError::Forbidden)
        }
    }

    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), ApiError> {
        if roles.contains(&self.user.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-key sliding window
// ═══════════════════════════════════════════════════════════

/// Per-key rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(100, 1000)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// Check if a key is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        if self.windows.len() > 10_000 {
            self.windows.retain(|_, hits| {
                hits.last()
                    .is_some_and(|ts| now.duration_since(*ts) < Duration::from_secs(3600))
            });
        }
        let entries = self.windows.entry(key.to_string()).or_default();

        entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(3600));

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn auth(role: UserRole) -> AuthUser {
        AuthUser {
            user: User {
                id: Uuid::new_v4(),
                email: "someone@example.com".into(),
                name: "Someone".into(),
                role,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            token_hash: "h".into(),
        }
    }

    #[test]
    fn require_follows_page_table() {
        assert!(auth(UserRole::Finance).require(Page::Experts).is_err());
        assert!(auth(UserRole::Pm).require(Page::Experts).is_ok());
        assert!(auth(UserRole::Ra).require(Page::Analytics).is_err());
    }

    #[test]
    fn require_role_checks_membership() {
        let pm = auth(UserRole::Pm);
        assert!(pm.require_role(&[UserRole::Admin, UserRole::Pm]).is_ok());
        assert!(pm.require_role(&[UserRole::Admin]).is_err());
    }

    #[test]
    fn rate_limiter_allows_under_limit() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_ok());
    }

    #[test]
    fn rate_limiter_rejects_over_per_minute() {
        let mut limiter = RateLimiter::with_limits(2, 1000);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_ok());
        assert_eq!(limiter.check("k"), Err(60));
    }

    #[test]
    fn rate_limiter_isolates_keys() {
        let mut limiter = RateLimiter::with_limits(1, 1000);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert_eq!(limiter.check("a"), Err(60));
    }

    #[test]
    fn per_hour_limit_applies() {
        let mut limiter = RateLimiter::with_limits(100, 2);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_ok());
        assert_eq!(limiter.check("k"), Err(3600));
    }
}
