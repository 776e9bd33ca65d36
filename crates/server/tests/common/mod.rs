//! Common test utilities for in-process E2E testing.
//!
//! The fixture builds the real router over an in-memory database and
//! a memory cache. Requests act as a user through the `X-User-Id` header
//! (`none` auth method). Relay traffic lands on an mpsc receiver.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use orpheum_core::{
    AuthConfig, AuthMethod, Config, Database, DatabaseConfig, IrcConfig, MemoryCache,
    NoneAuthenticator, NotifyHandle, ServerConfig, SiteConfig,
};
use orpheum_server::state::AppState;

/// Re-export fixtures for test convenience
pub use orpheum_core::testing::fixtures;

/// Forum id announced on the moderation channel in tests.
pub const STAFF_FORUM_ID: u32 = 1;

/// Test fixture for E2E testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_collage() {
///     let fixture = TestFixture::new();
///     let alice = fixture.user("alice", 100, &[]);
///
///     let response = fixture.post(alice, "/api/v1/collages", json!({
///         "category": "theme",
///         "name": "Night drives"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct store access for seeding and assertions
    pub db: Database,
    /// Relay lines handed off by the server
    pub relay: mpsc::Receiver<String>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let db = Database::in_memory().expect("Failed to open database");
        let (tx, relay) = mpsc::channel(16);

        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                tokens: Default::default(),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig::default(),
            site: SiteConfig {
                site_url: "https://tracker.test".to_string(),
                staff_forum_id: Some(STAFF_FORUM_ID),
            },
            irc: IrcConfig::default(),
        };

        let state = Arc::new(AppState::new(
            config,
            Arc::new(NoneAuthenticator),
            db.clone(),
            Arc::new(MemoryCache::new()),
            NotifyHandle::new(tx),
        ));

        Self {
            router: orpheum_server::api::create_router(state),
            db,
            relay,
        }
    }

    /// Seed a user and return its id.
    pub fn user(&self, username: &str, class_level: u32, permissions: &[&str]) -> u32 {
        fixtures::seed_user(&self.db, username, class_level, permissions)
    }

    /// Send an unauthenticated GET request.
    pub async fn get_anonymous(&self, path: &str) -> TestResponse {
        self.request(None, "GET", path, None).await
    }

    /// Send a GET request as `user_id`.
    pub async fn get(&self, user_id: u32, path: &str) -> TestResponse {
        self.request(Some(user_id), "GET", path, None).await
    }

    /// Send a POST request with JSON body as `user_id`.
    pub async fn post(&self, user_id: u32, path: &str, body: Value) -> TestResponse {
        self.request(Some(user_id), "POST", path, Some(body)).await
    }

    /// Send a DELETE request as `user_id`.
    pub async fn delete(&self, user_id: u32, path: &str) -> TestResponse {
        self.request(Some(user_id), "DELETE", path, None).await
    }

    /// Send a request to the test server and collect its body.
    ///
    /// Non-JSON bodies are returned as a JSON string.
    async fn request(
        &self,
        user_id: Option<u32>,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(id) = user_id {
            request_builder = request_builder.header("X-User-Id", id.to_string());
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
