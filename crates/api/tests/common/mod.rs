#![allow(dead_code)]

use std::sync::Arc;

use aduan_api::auth::jwt::{generate_access_token, JwtConfig};
use aduan_api::auth::password::hash_password;
use aduan_api::config::ServerConfig;
use aduan_api::router::build_app_router;
use aduan_api::state::AppState;
use aduan_api::storage::PhotoStore;
use aduan_core::clock::FixedClock;
use aduan_core::roles::Role;
use aduan_core::types::{DbId, Timestamp};
use aduan_core::upload::DEFAULT_MAX_PHOTO_BYTES;
use aduan_db::models::user::CreateUser;
use aduan_db::repositories::UserRepo;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Monday 2 March 2026, 08:00 UTC. Every test starts here.
pub fn start_time() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

/// Build a test `ServerConfig` with safe defaults, storing photos under
/// `upload_dir`.
pub fn test_config(upload_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// The application under test plus the handles tests need to steer it.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub clock: Arc<FixedClock>,
    pub config: ServerConfig,
    pub uploads: TempDir,
}

impl TestApp {
    /// A fresh router sharing the same state. `oneshot` consumes it.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Create an active user with [`TEST_PASSWORD`] and return its id and a
    /// bearer token.
    pub async fn user(&self, role: Role, email: &str) -> (DbId, String) {
        let input = CreateUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            role_id: role.id(),
            phone: None,
        };
        let user = UserRepo::create(&self.pool, &input)
            .await
            .expect("user creation should succeed");
        let token = generate_access_token(user.id, role, &self.config.jwt)
            .expect("token generation should succeed");
        (user.id, token)
    }

    /// Submit a complaint as `token` and return its id.
    pub async fn submit(&self, token: &str, title: &str) -> DbId {
        let response = post_multipart_auth(
            self.app(),
            "/api/v1/complaints",
            &complaint_fields(title),
            None,
            token,
        )
        .await;
        assert_eq!(response.status(), 201, "submission should succeed");
        body_json(response).await["data"]["id"].as_i64().unwrap()
    }

    /// POST a lifecycle action (`claim`, `approve`, ...) with an optional note.
    pub async fn act(
        &self,
        token: &str,
        id: DbId,
        action: &str,
        note: Option<&str>,
    ) -> Response<Body> {
        let body = match note {
            Some(note) => serde_json::json!({ "note": note }),
            None => serde_json::json!({}),
        };
        post_json_auth(
            self.app(),
            &format!("/api/v1/complaints/{id}/{action}"),
            body,
            token,
        )
        .await
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and a clock pinned at [`start_time`].
///
/// Uses the same [`build_app_router`] as `main.rs`, so integration tests
/// exercise the production middleware stack.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let uploads = tempfile::tempdir().expect("temp dir");
    let config = test_config(uploads.path());
    let clock = Arc::new(FixedClock::new(start_time()));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        clock: clock.clone(),
        photos: Arc::new(PhotoStore::new(uploads.path())),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        clock,
        config,
        uploads,
    }
}

/// Text fields of a valid submission.
pub fn complaint_fields(title: &str) -> Vec<(&'static str, String)> {
    vec![
        ("category_id", "1".to_string()),
        ("title", title.to_string()),
        (
            "description",
            "The road surface has collapsed near the market entrance.".to_string(),
        ),
        ("location", "Jl. Merdeka 12".to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST with no body and no content type.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_auth(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_auth(app, Method::PUT, uri, body, token).await
}

async fn json_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

const BOUNDARY: &str = "aduan-test-boundary";

/// POST a `multipart/form-data` body. `photo` is `(file name, bytes)`.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    fields: &[(&str, String)],
    photo: Option<(&str, &[u8])>,
    token: &str,
) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
