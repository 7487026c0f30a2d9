//! Test helpers for the JSON API tests.
//!
//! Builds a router over an in-memory database with a recording mail
//! transport, plus helpers for the common register/login/confirm steps.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::{json, Value};

use flasky::config::Config;
use flasky::mail::{Email, MailQueue, RecordingTransport};
use flasky::web::{create_router, AppState};
use flasky::{Database, RoleRepository, TokenCodec, TokenPurpose};

pub const SECRET: &str = "test-secret-key-for-testing-only";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// A running test API.
pub struct TestApp {
    pub server: TestServer,
    pub mail: Arc<RecordingTransport>,
    pub tokens: TokenCodec,
    pub db: Database,
}

/// Create a test configuration.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.web.secret_key = SECRET.to_string();
    config.mail.admin = Some(ADMIN_EMAIL.to_string());
    config.mail.base_url = "http://flasky.test".to_string();
    config
}

/// Create a test server with an in-memory database and seeded roles.
pub async fn create_test_app() -> TestApp {
    let config = create_test_config();

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    {
        let mut tx = db.begin().await.unwrap();
        RoleRepository::new(&mut tx).insert_roles().await.unwrap();
        tx.commit().await.unwrap();
    }

    let mail = Arc::new(RecordingTransport::new());
    let queue = MailQueue::start(mail.clone());
    let state = AppState::new(db.clone(), &config, queue);

    let router = create_router(Arc::new(state), &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        mail,
        tokens: TokenCodec::new(SECRET, config.tokens.ttl_secs),
        db,
    }
}

impl TestApp {
    /// Register a user and return the response body.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Value {
        self.server
            .post("/api/auth/register")
            .json(&json!({
                "email": email,
                "username": username,
                "password": password,
                "password2": password
            }))
            .await
            .json::<Value>()
    }

    /// Register a user and return its session token and ID.
    pub async fn register_user(&self, email: &str, username: &str, password: &str) -> (String, i64) {
        let body = self.register(email, username, password).await;
        let token = body["data"]["access_token"]
            .as_str()
            .expect("registration should return a token")
            .to_string();
        let id = body["data"]["user"]["id"].as_i64().unwrap();
        (token, id)
    }

    /// Register and confirm a user; returns its session token and ID.
    pub async fn confirmed_user(&self, email: &str, username: &str, password: &str) -> (String, i64) {
        let (token, id) = self.register_user(email, username, password).await;
        let confirm = self
            .tokens
            .issue(TokenPurpose::Confirm, id, None, None)
            .unwrap();
        self.server
            .get(&format!("/api/auth/confirm/{}", confirm))
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status_ok();
        (token, id)
    }

    /// Log in and return the response body.
    pub async fn login(&self, email: &str, password: &str) -> Value {
        self.server
            .post("/api/auth/login")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .await
            .json::<Value>()
    }

    /// Wait until at least `count` mails have been delivered.
    pub async fn wait_for_mail(&self, count: usize) -> Vec<Email> {
        for _ in 0..200 {
            let sent = self.mail.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} mails, got {}",
            count,
            self.mail.sent().len()
        );
    }
}

/// Authorization header value for a session token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Pull the token out of the link in a mail body.
pub fn link_token(email: &Email) -> String {
    email
        .text_body
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("http://flasky.test/"))
        .and_then(|link| link.rsplit('/').next())
        .expect("mail should contain a link")
        .to_string()
}
