//! HTTP router.
//!
//! Everything lives under `/api/`. Three groups share one `ApiContext`:
//! staff routes (auth required), the login route, and the public invitation
//! pages (no auth, per-token rate limit).
//!
//! Staff middleware stack (outermost → innermost):
//! 1. Rate limiter → 2. Auth validator → 3. Audit logger

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over shared application state.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    use endpoints::*;

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    // Sibling routes must share a param name at the same position.
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/permissions", get(auth::permissions))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/change-password", post(auth::change_password))
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route(
            "/client-organizations",
            get(clients::list_organizations).post(clients::create_organization),
        )
        .route(
            "/client-organizations/:id",
            get(clients::get_organization)
                .patch(clients::update_organization)
                .delete(clients::delete_organization),
        )
        .route(
            "/client-pocs",
            get(clients::list_pocs).post(clients::create_poc),
        )
        .route(
            "/client-pocs/:id",
            get(clients::get_poc)
                .patch(clients::update_poc)
                .delete(clients::delete_poc),
        )
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:id",
            get(projects::get)
                .patch(projects::update)
                .delete(projects::remove),
        )
        .route("/projects/:id/activity", get(projects::activity))
        .route("/projects/:id/shortlist.pdf", get(projects::shortlist_pdf))
        .route("/experts", get(experts::list).post(experts::create))
        .route(
            "/experts/:id",
            get(experts::get).patch(experts::update).delete(experts::remove),
        )
        .route(
            "/vetting-questions",
            get(vetting::list).post(vetting::create),
        )
        .route(
            "/vetting-questions/:id",
            axum::routing::patch(vetting::update).delete(vetting::remove),
        )
        .route(
            "/project-experts",
            get(project_experts::list).post(project_experts::assign),
        )
        .route(
            "/project-experts/:id",
            axum::routing::patch(project_experts::update).delete(project_experts::remove),
        )
        .route("/project-experts/:id/invite", post(project_experts::invite))
        .route("/project-experts/:id/select", post(project_experts::select))
        .route("/project-experts/:id/schedule", post(project_experts::schedule))
        .route("/call-records", get(calls::list).post(calls::create))
        .route("/call-records/:id", axum::routing::patch(calls::update))
        .route(
            "/invitation-links",
            get(invitation_links::list).post(invitation_links::create),
        )
        .route("/invitation-links/:key", get(invitation_links::get))
        .route(
            "/invitation-links/:key/deactivate",
            post(invitation_links::deactivate),
        )
        .route("/usage", get(usage::list).post(usage::create))
        .route("/usage/export", get(usage::export))
        .route("/ra-incentives", get(incentives::list))
        .route("/ra-incentives/:ra_id", get(incentives::detail))
        .route("/analytics/summary", get(analytics::summary))
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    let invites = Router::new()
        .route("/expert-invite/:token", get(invites::open_link))
        .route("/expert-invite/:token/accept", post(invites::accept_link))
        .route("/expert-invite/:token/decline", post(invites::decline_link))
        .route("/quick-invite/:token", get(invites::open_quick))
        .route("/quick-invite/:token/decision", get(invites::quick_decision))
        .route("/quick-invite/:token/decide", post(invites::decide_quick))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit_invite))
        .layer(axum::Extension(ctx.clone()));

    let open = Router::new()
        .route("/health", get(health::check))
        .with_state(ctx.clone());

    let api = Router::new()
        .merge(protected)
        .merge(login)
        .merge(invites)
        .merge(open);

    let mut app = Router::new()
        .nest("/api", api)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ));
    if let Some(cors) = cors_layer(ctx.core.config.server.cors_origin.as_deref()) {
        app = app.layer(cors);
    }
    app
}

/// CORS for the browser client, when it is served from another origin.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match HeaderValue::from_str(origin) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .expose_headers([header::CONTENT_DISPOSITION, header::RETRY_AFTER]),
        ),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::crypto::{generate_token, hash_token};
    use crate::db::repository::fixtures;
    use crate::db::{self, now};
    use crate::models::*;

    struct Harness {
        _dir: tempfile::TempDir,
        core: Arc<CoreState>,
        app: Router,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::with_database(&dir.path().join("desk.db")));
        core.open_db().unwrap();
        let app = api_router(core.clone());
        Harness {
            _dir: dir,
            core,
            app,
        }
    }

    impl Harness {
        /// Seed a user and return a live bearer token for them.
        fn sign_in(&self, email: &str, role: UserRole) -> (User, String) {
            let conn = self.core.open_db().unwrap();
            let user = fixtures::user(&conn, email, role);
            let token = generate_token();
            let at = now();
            db::insert_session(&conn, &hash_token(&token), &user.id, at, at + Duration::hours(1))
                .unwrap();
            (user, token)
        }

        async fn raw(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> axum::response::Response {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header("Authorization", format!("Bearer {token}"));
            }
            let body = match body {
                Some(value) => {
                    builder = builder.header("Content-Type", "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };
            self.app
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap()
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let response = self.raw(method, uri, token, body).await;
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = harness();
        let (status, body) = h.call("GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn staff_routes_require_a_token() {
        let h = harness();
        let (status, body) = h.call("GET", "/api/projects", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let (status, _) = h.call("GET", "/api/projects", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_issues_a_working_token() {
        let h = harness();
        {
            let conn = h.core.open_db().unwrap();
            fixtures::user(&conn, "pm@example.com", UserRole::Pm);
        }

        let (status, _) = h
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "pm@example.com", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, session) = h
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "PM@example.com", "password": "password-123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["user"]["role"], "pm");
        assert!(session["permissions"]["pages"]
            .as_array()
            .unwrap()
            .contains(&json!("/experts")));

        let token = session["token"].as_str().unwrap();
        let (status, me) = h.call("GET", "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "pm@example.com");
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let h = harness();
        let (_, token) = h.sign_in("ra@example.com", UserRole::Ra);

        let (status, _) = h.call("POST", "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = h.call("GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn change_password_replaces_every_session() {
        let h = harness();
        let (_, token) = h.sign_in("pm@example.com", UserRole::Pm);

        let (status, _) = h
            .call(
                "POST",
                "/api/auth/change-password",
                Some(&token),
                Some(json!({"currentPassword": "nope-nope-nope", "newPassword": "brand-new-secret"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, session) = h
            .call(
                "POST",
                "/api/auth/change-password",
                Some(&token),
                Some(json!({"currentPassword": "password-123", "newPassword": "brand-new-secret"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = h.call("GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let fresh = session["token"].as_str().unwrap();
        let (status, _) = h.call("GET", "/api/auth/me", Some(fresh), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn pages_gate_resources_by_role() {
        let h = harness();
        let (_, finance) = h.sign_in("finance@example.com", UserRole::Finance);
        let (_, ra) = h.sign_in("ra@example.com", UserRole::Ra);
        let (_, pm) = h.sign_in("pm@example.com", UserRole::Pm);

        let (status, body) = h.call("GET", "/api/experts", Some(&finance), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, _) = h.call("GET", "/api/analytics/summary", Some(&ra), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = h.call("GET", "/api/users", Some(&ra), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = h.call("GET", "/api/users", Some(&pm), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = h.call("GET", "/api/experts", Some(&pm), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = h.call("GET", "/api/usage", Some(&finance), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_manages_employees() {
        let h = harness();
        let (admin, token) = h.sign_in("admin@example.com", UserRole::Admin);

        let (status, created) = h
            .call(
                "POST",
                "/api/users",
                Some(&token),
                Some(json!({
                    "email": "new.ra@example.com",
                    "name": "New RA",
                    "role": "ra",
                    "password": "temporary-pass"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = h
            .call(
                "POST",
                "/api/users",
                Some(&token),
                Some(json!({
                    "email": "new.ra@example.com",
                    "name": "Again",
                    "role": "ra",
                    "password": "temporary-pass"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, updated) = h
            .call("PATCH", &format!("/api/users/{id}"), Some(&token), Some(json!({"isActive": false})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["isActive"], false);

        let (status, _) = h
            .call("DELETE", &format!("/api/users/{}", admin.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = h.call("GET", "/api/users/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_bodies_are_validation_errors() {
        let h = harness();
        let (_, pm) = h.sign_in("pm@example.com", UserRole::Pm);
        let (status, body) = h
            .call("POST", "/api/projects", Some(&pm), Some(json!({"name": "  "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION");
    }

    #[tokio::test]
    async fn pipeline_through_quick_invite_and_completed_call() {
        let h = harness();
        let (pm_user, pm) = h.sign_in("pm@example.com", UserRole::Pm);

        let (status, project) = h
            .call(
                "POST",
                "/api/projects",
                Some(&pm),
                Some(json!({"name": "Lithium pricing", "cuBudget": 10.0})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(project["pmId"], pm_user.id.to_string());
        let project_id = project["id"].as_str().unwrap().to_string();

        let (_, expert) = h
            .call("POST", "/api/experts", Some(&pm), Some(json!({"name": "Ana Costa"})))
            .await;
        let expert_id = expert["id"].as_str().unwrap().to_string();

        let (status, pe) = h
            .call(
                "POST",
                "/api/project-experts",
                Some(&pm),
                Some(json!({"projectId": project_id, "expertId": expert_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let pe_id = pe["id"].as_str().unwrap().to_string();

        let (status, invited) = h
            .call("POST", &format!("/api/project-experts/{pe_id}/invite"), Some(&pm), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(invited["invitationStatus"], "invited");
        let token = invited["invitationToken"].as_str().unwrap().to_string();

        let (status, view) = h.call("GET", &format!("/api/quick-invite/{token}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["expertName"], "Ana Costa");

        let decide = json!({"decision": "accept", "availabilityNote": "Tuesdays"});
        let (status, answered) = h
            .call("POST", &format!("/api/quick-invite/{token}/decide"), None, Some(decide.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answered["status"], "accepted");

        let (status, body) = h
            .call("POST", &format!("/api/quick-invite/{token}/decide"), None, Some(decide))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["reason"], "usedLink");

        let (_, decision) = h
            .call("GET", &format!("/api/quick-invite/{token}/decision"), None, None)
            .await;
        assert_eq!(decision["decision"], "accept");

        let (status, _) = h
            .call("POST", &format!("/api/project-experts/{pe_id}/select"), Some(&pm), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, scheduled) = h
            .call(
                "POST",
                &format!("/api/project-experts/{pe_id}/schedule"),
                Some(&pm),
                Some(json!({"callDate": "2025-06-03T14:00:00Z", "durationMinutes": 45})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let call_id = scheduled["callRecord"]["id"].as_str().unwrap().to_string();

        let (status, call) = h
            .call(
                "PATCH",
                &format!("/api/call-records/{call_id}"),
                Some(&pm),
                Some(json!({"status": "completed", "durationMinutes": 53})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(call["cuUsed"], 1.0);

        let (status, body) = h
            .call(
                "PATCH",
                &format!("/api/call-records/{call_id}"),
                Some(&pm),
                Some(json!({"status": "pending"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (_, detail) = h
            .call("GET", &format!("/api/projects/{project_id}"), Some(&pm), None)
            .await;
        assert_eq!(detail["cuConsumed"], 1.0);
        assert_eq!(detail["cuRemaining"], 9.0);

        let (_, activity) = h
            .call("GET", &format!("/api/projects/{project_id}/activity"), Some(&pm), None)
            .await;
        assert!(activity.as_array().unwrap().len() >= 5);
    }

    #[tokio::test]
    async fn ra_link_is_consumed_once_and_credits_the_ra() {
        let h = harness();
        let (ra_user, ra) = h.sign_in("ra@example.com", UserRole::Ra);
        let project_id = {
            let conn = h.core.open_db().unwrap();
            fixtures::project(&conn, "Cement demand").id
        };

        let (status, link) = h
            .call(
                "POST",
                "/api/invitation-links",
                Some(&ra),
                Some(json!({"inviteType": "ra", "projectId": project_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(link["raId"], ra_user.id.to_string());
        let token = link["token"].as_str().unwrap().to_string();

        let (status, view) = h.call("GET", &format!("/api/expert-invite/{token}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["project"]["name"], "Cement demand");

        let (status, body) = h
            .call("POST", &format!("/api/expert-invite/{token}/accept"), None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION");

        let accept = json!({"expert": {"name": "Rui Lopes", "email": "rui@example.com"}});
        let (status, outcome) = h
            .call("POST", &format!("/api/expert-invite/{token}/accept"), None, Some(accept.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["projectExpert"]["invitationStatus"], "accepted");

        let (status, body) = h
            .call("POST", &format!("/api/expert-invite/{token}/accept"), None, Some(accept))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "USED_LINK");

        let (_, summaries) = h.call("GET", "/api/ra-incentives", Some(&ra), None).await;
        let summaries = summaries.as_array().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0]["totalRecruitedExperts"], 1);
    }

    #[tokio::test]
    async fn unknown_invite_tokens_are_invalid_links() {
        let h = harness();
        let (status, body) = h.call("GET", "/api/expert-invite/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["reason"], "invalidLink");

        let (status, body) = h.call("GET", "/api/quick-invite/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["reason"], "invalidLink");
    }

    #[tokio::test]
    async fn deactivated_link_reads_as_invalid() {
        let h = harness();
        let (_, pm) = h.sign_in("pm@example.com", UserRole::Pm);
        let (_, link) = h
            .call("POST", "/api/invitation-links", Some(&pm), Some(json!({"inviteType": "general"})))
            .await;
        let id = link["id"].as_str().unwrap().to_string();
        let token = link["token"].as_str().unwrap().to_string();

        let (status, by_token) = h
            .call("GET", &format!("/api/invitation-links/{token}"), Some(&pm), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_token["id"], id);

        let (status, _) = h
            .call("POST", &format!("/api/invitation-links/{id}/deactivate"), Some(&pm), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = h.call("GET", &format!("/api/expert-invite/{token}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["reason"], "invalidLink");
    }

    #[tokio::test]
    async fn ra_cannot_read_another_ras_incentives() {
        let h = harness();
        let (_, ra) = h.sign_in("ra@example.com", UserRole::Ra);
        let (other, _) = h.sign_in("other.ra@example.com", UserRole::Ra);
        let (_, finance) = h.sign_in("finance@example.com", UserRole::Finance);

        let uri = format!("/api/ra-incentives/{}", other.id);
        let (status, _) = h.call("GET", &uri, Some(&ra), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, detail) = h.call("GET", &uri, Some(&finance), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["totalIncentiveBRL"], 0.0);

        let (_, all) = h.call("GET", "/api/ra-incentives", Some(&finance), None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (status, _) = h
            .call("GET", "/api/ra-incentives?fromDate=2025-02-01&toDate=2025-01-01", Some(&finance), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn usage_export_is_csv() {
        let h = harness();
        let (_, finance) = h.sign_in("finance@example.com", UserRole::Finance);
        {
            let conn = h.core.open_db().unwrap();
            let project = fixtures::project(&conn, "Steel");
            let expert = fixtures::expert(&conn, "Ines", None);
            crate::workflow::record_usage(
                &conn,
                &NewUsageRecord {
                    project_id: project.id,
                    expert_id: expert.id,
                    call_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                    duration_minutes: 30,
                    credits_used: None,
                    notes: None,
                },
                None,
            )
            .unwrap();
        }

        let response = h.raw("GET", "/api/usage/export", Some(&finance), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains(".csv"));
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Date,Project,Client,Expert,Duration (min),Credits Used,Notes"));
        assert!(text.contains("2025-03-04,Steel,,Ines,30,0.50,"));
    }

    #[tokio::test]
    async fn shortlist_downloads_as_pdf() {
        let h = harness();
        let (_, pm) = h.sign_in("pm@example.com", UserRole::Pm);
        let project_id = {
            let conn = h.core.open_db().unwrap();
            fixtures::project(&conn, "Copper").id
        };

        let response = h
            .raw("GET", &format!("/api/projects/{project_id}/shortlist.pdf"), Some(&pm), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 22).await.unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[tokio::test]
    async fn patch_cannot_skip_selection_or_scheduling() {
        let h = harness();
        let (_, ra) = h.sign_in("ra@example.com", UserRole::Ra);
        let (_, pm) = h.sign_in("pm@example.com", UserRole::Pm);
        let pe_id = {
            let conn = h.core.open_db().unwrap();
            let project = fixtures::project(&conn, "Nickel");
            let expert = fixtures::expert(&conn, "Caio", None);
            fixtures::assignment(&conn, &project, &expert).id
        };
        let uri = format!("/api/project-experts/{pe_id}");

        let (status, accepted) = h
            .call("PATCH", &uri, Some(&ra), Some(json!({"status": "accepted"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["invitationStatus"], "accepted");
        assert_eq!(accepted["pipelineStatus"], "interested");
        assert!(accepted["respondedAt"].is_string());

        for target in ["client_selected", "scheduled", "completed"] {
            let (status, body) = h
                .call("PATCH", &uri, Some(&ra), Some(json!({"status": target})))
                .await;
            assert_eq!(status, StatusCode::CONFLICT, "{target}");
            assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
        }

        let (status, _) = h.call("POST", &format!("{uri}/select"), Some(&ra), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, selected) = h.call("POST", &format!("{uri}/select"), Some(&pm), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(selected["status"], "client_selected");
        assert!(selected["selectedAt"].is_string());
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let h = harness();
        let (_, pm) = h.sign_in("pm@example.com", UserRole::Pm);
        let response = h.raw("GET", "/api/projects", Some(&pm), None).await;
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["cache-control"], "no-store");
    }

    #[test]
    fn cors_layer_needs_a_valid_origin() {
        assert!(cors_layer(None).is_none());
        assert!(cors_layer(Some("bad\norigin")).is_none());
        assert!(cors_layer(Some("https://desk.example.com")).is_some());
    }
}
