//! Web API Authentication Tests
//!
//! Integration tests for the account endpoints.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use chrono::Utc;
use flasky::TokenPurpose;
use serde_json::{json, Value};

use common::{bearer, create_test_app, link_token, ADMIN_EMAIL};

const INVALID_LINK: &str = "The confirmation link is invalid or has expired.";

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "email": "John@Example.com",
            "username": "john",
            "password": "cat",
            "password2": "cat"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["username"], "john");
    assert_eq!(body["data"]["user"]["email"], "john@example.com");
    assert_eq!(body["data"]["user"]["confirmed"], false);
    assert_eq!(body["data"]["user"]["role"], "User");
}

#[tokio::test]
async fn test_register_sends_confirmation_and_admin_notice() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let sent = app.wait_for_mail(2).await;
    let confirm = sent
        .iter()
        .find(|m| m.to == "john@example.com")
        .expect("confirmation mail");
    assert_eq!(confirm.subject, "[Flasky] Confirm Your Account");
    assert!(confirm.text_body.contains("http://flasky.test/api/auth/confirm/"));

    let notice = sent.iter().find(|m| m.to == ADMIN_EMAIL).expect("admin mail");
    assert_eq!(notice.subject, "[Flasky] New User");
    assert!(notice.text_body.contains("john"));
}

#[tokio::test]
async fn test_register_admin_address_gets_admin_role() {
    let app = create_test_app().await;
    let body = app.register("ADMIN@example.com", "boss", "cat").await;
    assert_eq!(body["data"]["user"]["role"], "Administrator");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "email": "JOHN@example.com",
            "username": "johnny",
            "password": "dog",
            "password2": "dog"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["email"][0], "Email already registered.");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "email": "other@example.com",
            "username": "john",
            "password": "dog",
            "password2": "dog"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["details"]["username"][0], "Username already in use.");
}

#[tokio::test]
async fn test_register_invalid_fields() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "username": "bad name!",
            "password": "cat",
            "password2": "dog"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    let details = &body["error"]["details"];
    assert!(details["email"].is_array());
    assert!(details["username"].is_array());
    assert_eq!(details["password2"][0], "Passwords must match.");
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "john@example.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let body = app.login("John@Example.com", "cat").await;
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["user"]["username"], "john");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "john@example.com", "password": "dog" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid email or password.");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": "cat" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid email or password.");
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_me_requires_session() {
    let app = create_test_app().await;

    app.server
        .get("/api/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer("garbage"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_session() {
    let app = create_test_app().await;
    let (token, id) = app.register_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["permissions"], json!(["follow", "comment", "write"]));
}

#[tokio::test]
async fn test_action_token_is_not_a_session() {
    let app = create_test_app().await;
    let (_, id) = app.register_user("john@example.com", "john", "cat").await;

    let confirm = app
        .tokens
        .issue(TokenPurpose::Confirm, id, None, None)
        .unwrap();

    app.server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&confirm))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout() {
    let app = create_test_app().await;
    let (token, _) = app.register_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/logout")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "You have been logged out.");
}

#[tokio::test]
async fn test_index_greeting() {
    let app = create_test_app().await;

    let body: Value = app.server.get("/api/").await.json();
    assert_eq!(body["data"]["greeting"], "Hello, Stranger!");
    assert_eq!(body["data"]["authenticated"], false);

    let (token, _) = app.register_user("john@example.com", "john", "cat").await;
    let body: Value = app
        .server
        .get("/api/")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(body["data"]["greeting"], "Hello, john!");
    assert_eq!(body["data"]["authenticated"], true);
}

#[tokio::test]
async fn test_user_profile() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let response = app.server.get("/api/users/john").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "john");
    assert_eq!(body["data"]["role"], "User");
    assert!(body["data"].get("email").is_none());

    app.server
        .get("/api/users/nobody")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Confirmation Tests
// ============================================================================

#[tokio::test]
async fn test_confirm_with_mailed_link() {
    let app = create_test_app().await;
    let (token, _) = app.register_user("john@example.com", "john", "cat").await;

    let sent = app.wait_for_mail(1).await;
    let mail = sent
        .iter()
        .find(|m| m.to == "john@example.com")
        .expect("confirmation mail");
    let confirm = link_token(mail);

    let response = app
        .server
        .get(&format!("/api/auth/confirm/{}", confirm))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "You have confirmed your account. Thanks!");
    assert_eq!(body["data"]["user"]["confirmed"], true);

    // A second visit is harmless.
    let body: Value = app
        .server
        .get(&format!("/api/auth/confirm/{}", confirm))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(body["data"]["message"], "Your account is already confirmed.");
}

#[tokio::test]
async fn test_confirm_requires_login() {
    let app = create_test_app().await;
    let (_, id) = app.register_user("john@example.com", "john", "cat").await;
    let confirm = app
        .tokens
        .issue(TokenPurpose::Confirm, id, None, None)
        .unwrap();

    app.server
        .get(&format!("/api/auth/confirm/{}", confirm))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_confirm_other_users_token() {
    let app = create_test_app().await;
    let (_, john_id) = app.register_user("john@example.com", "john", "cat").await;
    let (susan, _) = app.register_user("susan@example.org", "susan", "dog").await;

    let confirm = app
        .tokens
        .issue(TokenPurpose::Confirm, john_id, None, None)
        .unwrap();

    let response = app
        .server
        .get(&format!("/api/auth/confirm/{}", confirm))
        .add_header(AUTHORIZATION, bearer(&susan))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], INVALID_LINK);
}

#[tokio::test]
async fn test_confirm_expired_token() {
    let app = create_test_app().await;
    let (token, id) = app.register_user("john@example.com", "john", "cat").await;

    let confirm = app
        .tokens
        .issue_at(
            TokenPurpose::Confirm,
            id,
            None,
            Some(1),
            Utc::now().timestamp() - 10,
        )
        .unwrap();

    let response = app
        .server
        .get(&format!("/api/auth/confirm/{}", confirm))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], INVALID_LINK);
}

#[tokio::test]
async fn test_resend_confirmation() {
    let app = create_test_app().await;
    let (token, _) = app.register_user("john@example.com", "john", "cat").await;
    app.wait_for_mail(2).await;

    let response = app
        .server
        .post("/api/auth/confirm")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["data"]["message"],
        "A new confirmation email has been sent to you by email."
    );

    let sent = app.wait_for_mail(3).await;
    assert_eq!(
        sent.iter().filter(|m| m.to == "john@example.com").count(),
        2
    );
}

#[tokio::test]
async fn test_unconfirmed_user_is_blocked() {
    let app = create_test_app().await;
    let (token, _) = app.register_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/change-password")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "old_password": "cat",
            "password": "dog",
            "password2": "dog"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNCONFIRMED");
}

// ============================================================================
// Password Tests
// ============================================================================

#[tokio::test]
async fn test_change_password() {
    let app = create_test_app().await;
    let (token, _) = app.confirmed_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/change-password")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "old_password": "cat",
            "password": "dog",
            "password2": "dog"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Your password has been updated.");

    assert!(app.login("john@example.com", "dog").await["data"]["access_token"].is_string());
    assert!(app.login("john@example.com", "cat").await["error"].is_object());
}

#[tokio::test]
async fn test_change_password_wrong_old_password() {
    let app = create_test_app().await;
    let (token, _) = app.confirmed_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/change-password")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "old_password": "horse",
            "password": "dog",
            "password2": "dog"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid password.");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;
    app.wait_for_mail(2).await;

    let response = app
        .server
        .post("/api/auth/reset")
        .json(&json!({ "email": "john@example.com" }))
        .await;
    response.assert_status_ok();

    let sent = app.wait_for_mail(3).await;
    let mail = sent
        .iter()
        .find(|m| m.subject == "[Flasky] Reset Your Password")
        .expect("reset mail");
    assert_eq!(mail.to, "john@example.com");
    let reset = link_token(mail);

    let response = app
        .server
        .post(&format!("/api/auth/reset/{}", reset))
        .json(&json!({ "password": "dog", "password2": "dog" }))
        .await;
    response.assert_status_ok();

    assert!(app.login("john@example.com", "dog").await["data"]["access_token"].is_string());
}

#[tokio::test]
async fn test_password_reset_unknown_email_looks_the_same() {
    let app = create_test_app().await;
    app.register("john@example.com", "john", "cat").await;

    let known: Value = app
        .server
        .post("/api/auth/reset")
        .json(&json!({ "email": "john@example.com" }))
        .await
        .json();
    let unknown: Value = app
        .server
        .post("/api/auth/reset")
        .json(&json!({ "email": "nobody@example.com" }))
        .await
        .json();

    assert_eq!(known, unknown);

    // Confirmation + admin notice + one reset mail, nothing for the unknown address.
    let sent = app.wait_for_mail(3).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(app.mail.sent().len(), sent.len());
    assert!(sent.iter().all(|m| m.to != "nobody@example.com"));
}

#[tokio::test]
async fn test_password_reset_bad_token() {
    let app = create_test_app().await;
    let (_, id) = app.register_user("john@example.com", "john", "cat").await;

    // A confirm token is not a reset token.
    let confirm = app
        .tokens
        .issue(TokenPurpose::Confirm, id, None, None)
        .unwrap();

    for token in [confirm.as_str(), "garbage"] {
        let response = app
            .server
            .post(&format!("/api/auth/reset/{}", token))
            .json(&json!({ "password": "dog", "password2": "dog" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], INVALID_LINK);
    }

    assert!(app.login("john@example.com", "cat").await["data"]["access_token"].is_string());
}

#[tokio::test]
async fn test_password_reset_for_missing_account() {
    let app = create_test_app().await;

    let reset = app
        .tokens
        .issue(TokenPurpose::Reset, 4242, None, None)
        .unwrap();

    let response = app
        .server
        .post(&format!("/api/auth/reset/{}", reset))
        .json(&json!({ "password": "dog", "password2": "dog" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], INVALID_LINK);
}

// ============================================================================
// Email Change Tests
// ============================================================================

#[tokio::test]
async fn test_change_email_flow() {
    let app = create_test_app().await;
    let (token, _) = app.confirmed_user("john@example.com", "john", "cat").await;
    app.wait_for_mail(2).await;

    let response = app
        .server
        .post("/api/auth/change-email")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": "John@Example.net", "password": "cat" }))
        .await;
    response.assert_status_ok();

    let sent = app.wait_for_mail(3).await;
    let mail = sent
        .iter()
        .find(|m| m.to == "john@example.net")
        .expect("change email mail");
    assert_eq!(mail.subject, "[Flasky] Confirm your email address");
    let change = link_token(mail);

    let response = app
        .server
        .get(&format!("/api/auth/change-email/{}", change))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Your email address has been updated.");
    assert_eq!(body["data"]["user"]["email"], "john@example.net");

    assert!(app.login("john@example.net", "cat").await["data"]["access_token"].is_string());
}

#[tokio::test]
async fn test_change_email_wrong_password() {
    let app = create_test_app().await;
    let (token, _) = app.confirmed_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/change-email")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": "john@example.net", "password": "dog" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_email_taken() {
    let app = create_test_app().await;
    app.register("susan@example.org", "susan", "dog").await;
    let (token, _) = app.confirmed_user("john@example.com", "john", "cat").await;

    let response = app
        .server
        .post("/api/auth/change-email")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": "Susan@example.org", "password": "cat" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["details"]["email"][0], "Email already registered.");
}

#[tokio::test]
async fn test_change_email_other_users_token() {
    let app = create_test_app().await;
    let (_, john_id) = app.confirmed_user("john@example.com", "john", "cat").await;
    let (susan, _) = app.confirmed_user("susan@example.org", "susan", "dog").await;

    let change = app
        .tokens
        .issue(
            TokenPurpose::ChangeEmail,
            john_id,
            Some("john@example.net"),
            None,
        )
        .unwrap();

    let response = app
        .server
        .get(&format!("/api/auth/change-email/{}", change))
        .add_header(AUTHORIZATION, bearer(&susan))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], INVALID_LINK);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}
