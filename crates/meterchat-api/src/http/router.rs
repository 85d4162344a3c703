//! Axum router configuration with middleware.
//!
//! Routes are registered per method; any other method on a known path gets
//! axum's 405. Middleware: request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::misc::index))
        .route("/favicon.ico", get(handlers::misc::favicon))
        .route("/health", get(handlers::misc::health_check))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/chat/{model}", post(handlers::chat::chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use meterchat_core::llm::box_provider::BoxCompletionProvider;
    use meterchat_core::llm::provider::CompletionProvider;
    use meterchat_infra::sqlite::pool::DatabasePool;
    use meterchat_types::config::RelayConfig;
    use meterchat_types::llm::{CompletionRequest, CompletionResponse, LlmError};
    use tower::ServiceExt;

    /// Replies with fixed text, or fails every call when `reply` is `None`.
    struct FixedReply {
        reply: Option<String>,
    }

    impl CompletionProvider for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            match &self.reply {
                Some(reply) => Ok(CompletionResponse {
                    content: reply.clone(),
                    model: request.model.clone(),
                    usage: None,
                }),
                None => Err(LlmError::Provider {
                    message: "connection reset by peer".to_string(),
                }),
            }
        }
    }

    struct TestApp {
        router: Router,
        state: AppState,
    }

    async fn app_with(default_balance: u64, reply: Option<&str>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        std::mem::forget(dir);
        let pool = DatabasePool::new(&url).await.unwrap();

        let mut config = RelayConfig::default();
        config.budget.default_balance = default_balance;

        let provider = BoxCompletionProvider::new(FixedReply {
            reply: reply.map(str::to_string),
        });
        let state = AppState::from_parts(pool, config, provider);
        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }

    async fn app() -> TestApp {
        app_with(1000, Some("hi back")).await
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    }

    impl Reply {
        /// `name=value` of the first Set-Cookie header, ready for a Cookie header.
        fn cookie(&self) -> String {
            let raw = self
                .headers
                .get(header::SET_COOKIE)
                .expect("set-cookie header")
                .to_str()
                .unwrap();
            raw.split(';').next().unwrap().to_string()
        }
    }

    async fn send(app: &TestApp, request: Request<Body>) -> Reply {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn register_and_login(app: &TestApp, username: &str) -> String {
        let creds = format!("username={username}&password=pw1");
        let reply = send(app, form_post("/register", &creds, None)).await;
        assert_eq!(reply.status, StatusCode::OK);
        let reply = send(app, form_post("/login", &creds, None)).await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.cookie()
    }

    async fn balance_of(app: &TestApp, username: &str) -> u64 {
        app.state
            .auth_service
            .find_user(username)
            .await
            .unwrap()
            .unwrap()
            .token_balance
    }

    #[tokio::test]
    async fn test_index_favicon_health() {
        let app = app().await;

        let reply = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "hello there");

        let reply = send(&app, Request::get("/favicon.ico").body(Body::empty()).unwrap()).await;
        assert_eq!(reply.status, StatusCode::NO_CONTENT);

        let reply = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let app = app().await;

        let reply = send(&app, form_post("/register", "username=alice&password=pw1", None)).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "registered successfully");

        let reply = send(&app, form_post("/register", "username=alice&password=pw2", None)).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(reply.body, "username has been taken");
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let app = app().await;

        let reply = send(&app, form_post("/register", "username=alice", None)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, "no username or password provided");

        let request = Request::post("/register").body(Body::empty()).unwrap();
        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_unregistered_and_wrong_password() {
        let app = app().await;

        let reply = send(&app, form_post("/login", "username=bob&password=pw", None)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, "you have not registered yet");

        send(&app, form_post("/register", "username=bob&password=pw", None)).await;
        let reply = send(&app, form_post("/login", "username=bob&password=nope", None)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, "password is incorrect");
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_repeat_login_is_noop() {
        let app = app().await;
        let cookie = register_and_login(&app, "alice").await;
        assert!(cookie.starts_with("session_id="));

        let reply = send(
            &app,
            form_post("/login", "username=alice&password=pw1", Some(&cookie)),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "you have logged in already");
        assert!(reply.headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_chat_debits_reply_cost() {
        let app = app_with(20, Some(&"r".repeat(20))).await;
        let cookie = register_and_login(&app, "alice").await;
        let message = format!("message={}", "m".repeat(40));

        let reply = send(&app, form_post("/chat/gpt-3-turbo", &message, Some(&cookie))).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "r".repeat(20));
        assert!(reply.headers.get(header::SET_COOKIE).is_some());
        assert_eq!(balance_of(&app, "alice").await, 15);
    }

    #[tokio::test]
    async fn test_chat_over_budget_is_soft_reject() {
        let app = app_with(5, Some("never sent")).await;
        let cookie = register_and_login(&app, "alice").await;
        let message = format!("message={}", "m".repeat(40));

        for _ in 0..2 {
            let reply = send(&app, form_post("/chat/gpt-3-turbo", &message, Some(&cookie))).await;
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(reply.body, "you've reached limits");
            assert!(reply.headers.get(header::SET_COOKIE).is_none());
        }
        assert_eq!(balance_of(&app, "alice").await, 5);
    }

    #[tokio::test]
    async fn test_chat_requires_session() {
        let app = app().await;

        let reply = send(&app, form_post("/chat/gpt-3-turbo", "message=hi", None)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, "you have not logged in yet");

        let bogus = "session_id=not-a-uuid";
        let reply = send(&app, form_post("/chat/gpt-3-turbo", "message=hi", Some(bogus))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chat_missing_message() {
        let app = app().await;
        let cookie = register_and_login(&app, "alice").await;

        let reply = send(&app, form_post("/chat/gpt-3-turbo", "", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, "no message provided");
    }

    #[tokio::test]
    async fn test_chat_unknown_model_and_wrong_method() {
        let app = app().await;

        let reply = send(&app, form_post("/chat/gpt-9", "message=hi", None)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        let cookie = register_and_login(&app, "alice").await;

        let reply = send(&app, form_post("/chat/gpt-9", "message=hi", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body, "unknown model");

        let request = Request::get("/chat/gpt-3-turbo")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_generic_and_free() {
        let app = app_with(1000, None).await;
        let cookie = register_and_login(&app, "alice").await;

        let reply = send(&app, form_post("/chat/gpt-3-turbo", "message=hello", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body, "failed to get a reply, please try again");
        assert!(!reply.body.contains("connection reset"));
        assert_eq!(balance_of(&app, "alice").await, 1000);
        // The user's message was saved, so the cookie's Max-Age restarts.
        assert_eq!(reply.cookie(), cookie);
    }

    #[tokio::test]
    async fn test_logout_flow() {
        let app = app().await;

        let reply = send(&app, form_post("/logout", "", None)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, "you have not logged in yet");

        let cookie = register_and_login(&app, "alice").await;
        let reply = send(&app, form_post("/logout", "", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "logout successfully");
        let removal = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(removal.starts_with("session_id=;"));

        let reply = send(&app, form_post("/chat/gpt-3-turbo", "message=hi", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }
}
