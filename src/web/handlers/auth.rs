//! Authentication handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::auth::{self, RegistrationRequest};
use crate::db::User;
use crate::web::dto::{
    AccountResponse, ApiResponse, ChangeEmailRequest, ChangePasswordRequest, LoginRequest,
    MessageResponse, PasswordResetForm, PasswordResetRequest, RegisterRequest, SessionResponse,
    UserInfo, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, ConfirmedUser};

use super::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn message(text: &str) -> ApiResult<MessageResponse> {
    Ok(Json(ApiResponse::new(MessageResponse::new(text))))
}

fn session_for(state: &AppState, user: &User) -> Result<SessionResponse, ApiError> {
    Ok(SessionResponse {
        access_token: state.sessions.issue(user)?,
        token_type: "Bearer",
        expires_in: state.sessions.expiry_secs(),
        user: user.into(),
    })
}

fn send_confirmation(state: &AppState, user: &User) -> Result<(), ApiError> {
    let token = auth::confirmation_token(&state.tokens, user)?;
    state.send_mail(state.composer.confirm_account(user, &token));
    Ok(())
}

/// POST /api/auth/register - Create an account and log it in.
///
/// A confirmation mail goes to the new address and, when configured, a
/// notification goes to the administrator.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    let request = RegistrationRequest::new(req.email, req.username, req.password);
    let user = auth::register(&state.db, state.admin_email.as_deref(), request).await?;

    send_confirmation(&state, &user)?;
    if let Some(ref admin) = state.admin_email {
        state.send_mail(state.composer.new_user(admin, &user));
    }

    let session = session_for(&state, &user)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(session))))
}

/// POST /api/auth/login - Log in with email and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<SessionResponse> {
    let user = auth::authenticate(&state.db, &req.email, &req.password)
        .await
        .map_err(|e| {
            info!(email = %req.email, "Failed login attempt");
            ApiError::from(e)
        })?;

    info!(user_id = user.id, username = %user.username, "User logged in");
    Ok(Json(ApiResponse::new(session_for(&state, &user)?)))
}

/// POST /api/auth/logout - End the session.
///
/// Sessions are stateless; the client discards its token.
pub async fn logout(AuthUser(user): AuthUser) -> ApiResult<MessageResponse> {
    info!(user_id = user.id, "User logged out");
    message("You have been logged out.")
}

/// GET /api/auth/me - Current user.
pub async fn me(AuthUser(user): AuthUser) -> ApiResult<UserInfo> {
    Ok(Json(ApiResponse::new((&user).into())))
}

/// GET /api/auth/confirm/:token - Confirm the current user's account.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(token): Path<String>,
) -> ApiResult<AccountResponse> {
    if user.confirmed {
        return Ok(Json(ApiResponse::new(AccountResponse::new(
            "Your account is already confirmed.",
            &user,
        ))));
    }

    let user = auth::confirm(&state.db, &state.tokens, &user, &token).await?;
    Ok(Json(ApiResponse::new(AccountResponse::new(
        "You have confirmed your account. Thanks!",
        &user,
    ))))
}

/// POST /api/auth/confirm - Send a new confirmation mail.
pub async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<MessageResponse> {
    if user.confirmed {
        return message("Your account is already confirmed.");
    }

    send_confirmation(&state, &user)?;
    message("A new confirmation email has been sent to you by email.")
}

/// POST /api/auth/change-password - Change the password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    auth::change_password(&state.db, &user, &req.old_password, &req.password).await?;
    message("Your password has been updated.")
}

/// POST /api/auth/reset - Mail a password reset link.
///
/// The answer is the same whether or not the address is registered.
pub async fn password_reset_request(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> ApiResult<MessageResponse> {
    if let Some((user, token)) =
        auth::request_password_reset(&state.db, &state.tokens, &req.email).await?
    {
        state.send_mail(state.composer.reset_password(&user, &token));
    }
    message("An email with instructions to reset your password has been sent to you.")
}

/// POST /api/auth/reset/:token - Set a new password with a reset token.
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(req): ValidatedJson<PasswordResetForm>,
) -> ApiResult<MessageResponse> {
    auth::reset_password(&state.db, &state.tokens, &token, &req.password).await?;
    message("Your password has been updated.")
}

/// POST /api/auth/change-email - Mail a confirmation link to the new address.
pub async fn change_email_request(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    ValidatedJson(req): ValidatedJson<ChangeEmailRequest>,
) -> ApiResult<MessageResponse> {
    let new_email = req.email.trim().to_lowercase();
    let token =
        auth::request_email_change(&state.db, &state.tokens, &user, &new_email, &req.password)
            .await?;

    state.send_mail(state.composer.change_email(&user, &new_email, &token));
    message("An email with instructions to confirm your new email address has been sent to you.")
}

/// GET /api/auth/change-email/:token - Apply an email change.
pub async fn change_email(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    Path(token): Path<String>,
) -> ApiResult<AccountResponse> {
    let user = auth::change_email(&state.db, &state.tokens, &user, &token).await?;
    Ok(Json(ApiResponse::new(AccountResponse::new(
        "Your email address has been updated.",
        &user,
    ))))
}
