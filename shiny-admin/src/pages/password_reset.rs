//! Password reset: request, done, confirm, complete
//!
//! Requesting a reset issues a single-use token per active account with that
//! email and logs the confirmation link; there is no mail delivery. The
//! response is the same whether or not an account matched.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use shiny_common::password::validate_new_password;
use shiny_common::validation::{self, required_email};
use shiny_common::{reset_tokens, sessions, users, FieldErrors};
use tracing::{info, warn};
use validator::Validate;

use super::{form, input, layout, PageResult};
use crate::AppState;

pub const DONE_PATH: &str = "/password_reset/done/";
pub const COMPLETE_PATH: &str = "/password_reset/complete/";

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ResetRequestForm {
    #[validate(custom(function = "required_email"))]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordForm {
    pub new_password1: String,
    pub new_password2: String,
}

/// Path of the confirmation page for a token
pub fn confirm_path(user_id: i64, token: &str) -> String {
    format!("/password_reset/confirm/{}/{}/", user_id, token)
}

fn request_page(email: &str, errors: &FieldErrors) -> String {
    format!(
        "<h1>Password reset</h1>\n<p>Enter your email address and a reset link will be issued.</p>\n{}",
        form(
            "/password_reset/",
            &input("Email", "email", "email", email, errors),
            "Reset my password"
        )
    )
}

/// GET /password_reset/
pub async fn request_form() -> PageResult {
    Ok(layout("Password reset", &request_page("", &FieldErrors::new())).into_response())
}

/// POST /password_reset/
pub async fn request_reset(
    State(state): State<AppState>,
    Form(request): Form<ResetRequestForm>,
) -> PageResult {
    let request = ResetRequestForm {
        email: request.email.trim().to_string(),
    };

    let errors = validation::check(&request);
    if !errors.is_empty() {
        return Ok(layout("Password reset", &request_page(&request.email, &errors)).into_response());
    }

    for user in users::find_active_by_email(&state.db, &request.email).await? {
        let token =
            reset_tokens::issue_token(&state.db, user.id, state.config.password_reset_ttl_seconds)
                .await?;
        info!(
            "Password reset link for {}: {}{}",
            user.username,
            state.config.public_base_url.trim_end_matches('/'),
            confirm_path(user.id, &token)
        );
    }

    Ok(Redirect::to(DONE_PATH).into_response())
}

/// GET /password_reset/done/
pub async fn done() -> PageResult {
    let body = "<h1>Password reset requested</h1>\n<p>If an account exists with the email you entered, a reset link has been issued. Use it to choose a new password.</p>";
    Ok(layout("Password reset requested", body).into_response())
}

fn invalid_link_page() -> String {
    "<h1>Password reset unsuccessful</h1>\n<p>The password reset link was invalid, possibly because it has already been used. Please <a href=\"/password_reset/\">request a new password reset</a>.</p>".to_string()
}

fn set_password_page(action: &str, errors: &FieldErrors) -> String {
    let fields = [
        input("New password", "new_password1", "password", "", errors),
        input("New password confirmation", "new_password2", "password", "", errors),
    ]
    .join("\n");

    format!(
        "<h1>Enter new password</h1>\n{}",
        form(action, &fields, "Change my password")
    )
}

/// Resolve `:uid` to a user id when the token is currently valid for it
async fn valid_link(state: &AppState, uid: &str, token: &str) -> shiny_common::Result<Option<i64>> {
    let Ok(user_id) = uid.parse::<i64>() else {
        return Ok(None);
    };
    if reset_tokens::is_valid(&state.db, user_id, token).await? {
        Ok(Some(user_id))
    } else {
        Ok(None)
    }
}

/// GET /password_reset/confirm/:uid/:token/
pub async fn confirm_form(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
) -> PageResult {
    let body = match valid_link(&state, &uid, &token).await? {
        Some(user_id) => set_password_page(&confirm_path(user_id, &token), &FieldErrors::new()),
        None => {
            warn!("Password reset link rejected for uid {}", uid);
            invalid_link_page()
        }
    };
    Ok(layout("Enter new password", &body).into_response())
}

/// POST /password_reset/confirm/:uid/:token/
///
/// Sets the password, burns the token and ends every session of the user.
pub async fn confirm(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
    Form(passwords): Form<SetPasswordForm>,
) -> PageResult {
    let user = match valid_link(&state, &uid, &token).await? {
        Some(user_id) => users::get_user(&state.db, user_id).await?,
        None => None,
    };
    let Some(user) = user else {
        warn!("Password reset confirmation rejected for uid {}", uid);
        return Ok(layout("Password reset unsuccessful", &invalid_link_page()).into_response());
    };

    let mut errors = FieldErrors::new();
    if passwords.new_password1.is_empty() {
        errors.insert("new_password1".to_string(), vec!["This field is required.".to_string()]);
    }
    if passwords.new_password2.is_empty() {
        errors.insert("new_password2".to_string(), vec!["This field is required.".to_string()]);
    }
    if errors.is_empty() {
        let problems = validate_new_password(
            &user.username,
            &passwords.new_password1,
            &passwords.new_password2,
        );
        if !problems.is_empty() {
            errors.insert("new_password2".to_string(), problems);
        }
    }
    if !errors.is_empty() {
        let body = set_password_page(&confirm_path(user.id, &token), &errors);
        return Ok(layout("Enter new password", &body).into_response());
    }

    if !reset_tokens::consume(&state.db, user.id, &token).await? {
        return Ok(layout("Password reset unsuccessful", &invalid_link_page()).into_response());
    }

    users::set_password(&state.db, user.id, &passwords.new_password1).await?;
    let dropped = sessions::delete_user_sessions(&state.db, user.id).await?;
    info!(
        "Password reset for user {} ({} sessions ended)",
        user.id, dropped
    );

    Ok(Redirect::to(COMPLETE_PATH).into_response())
}

/// GET /password_reset/complete/
pub async fn complete() -> PageResult {
    let body = "<h1>Password reset complete</h1>\n<p>Your password has been set. You may go ahead and <a href=\"/login/\">log in</a> now.</p>";
    Ok(layout("Password reset complete", body).into_response())
}
