//! Sign-up, login and logout

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use shiny_common::db::Group;
use shiny_common::users::{self, Registration};
use shiny_common::{groups, sessions, Error, FieldErrors};
use tracing::info;

use super::{error_list, form, input, layout, text, PageResult};
use crate::auth::{removal_cookie, session_cookie, SessionContext};
use crate::AppState;

/// Message shown for any failed login
pub const LOGIN_FAILED: &str = "invalid login credentials, please try again";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn group_select(groups: &[Group], selected: &str, errors: &FieldErrors) -> String {
    let mut options = String::from("<option value=\"\">---------</option>");
    for group in groups {
        let id = group.id.to_string();
        let marker = if id == selected { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            id,
            marker,
            text(&group.name)
        ));
    }

    let messages = errors.get("group").map(Vec::as_slice).unwrap_or_default();
    format!(
        "<p>{}<label for=\"id_group\">Group</label> <select name=\"group\" id=\"id_group\">{}</select></p>",
        error_list(messages),
        options
    )
}

fn register_page(groups: &[Group], form_data: &Registration, errors: &FieldErrors) -> String {
    let fields = [
        input("Username", "username", "text", &form_data.username, errors),
        input("Email", "email", "email", &form_data.email, errors),
        input("Password", "password1", "password", "", errors),
        input("Password confirmation", "password2", "password", "", errors),
        group_select(groups, &form_data.group, errors),
    ]
    .join("\n");

    format!(
        "<h1>Register</h1>\n{}\n<p>Already registered? <a href=\"/login/\">Log in</a></p>",
        form("/register/", &fields, "Register")
    )
}

/// GET /register/
pub async fn register_form(State(state): State<AppState>) -> PageResult {
    let groups = groups::list_groups(&state.db).await?;
    let body = register_page(&groups, &Registration::default(), &FieldErrors::new());
    Ok(layout("Register", &body).into_response())
}

/// POST /register/
///
/// Creates the account and sends the user to the login page, or re-renders
/// the form with every field error. Nothing is written on failure.
pub async fn register(
    State(state): State<AppState>,
    Form(registration): Form<Registration>,
) -> PageResult {
    match users::register_user(&state.db, &registration).await {
        Ok(user) => {
            info!("Registered user {} ({})", user.id, user.username);
            Ok(Redirect::to("/login/").into_response())
        }
        Err(Error::Validation(errors)) => {
            let groups = groups::list_groups(&state.db).await?;
            let body = register_page(&groups, &registration, &errors);
            Ok(layout("Register", &body).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn login_page(username: &str, message: Option<&str>) -> String {
    let none = FieldErrors::new();
    let fields = [
        input("Username", "username", "text", username, &none),
        input("Password", "password", "password", "", &none),
    ]
    .join("\n");

    let errors = message
        .map(|m| format!("<p class=\"errors\">{}</p>\n", text(m)))
        .unwrap_or_default();

    format!(
        "<h1>Log in</h1>\n{}{}\n<p><a href=\"/register/\">Register</a> | <a href=\"/password_reset/\">Forgot your password?</a></p>",
        errors,
        form("/login/", &fields, "Log in")
    )
}

/// GET /login/
pub async fn login_form() -> PageResult {
    Ok(layout("Log in", &login_page("", None)).into_response())
}

/// POST /login/
///
/// On success a fresh session replaces any session the browser already had.
pub async fn login(
    State(state): State<AppState>,
    previous: Option<SessionContext>,
    Form(credentials): Form<LoginForm>,
) -> PageResult {
    let user = users::authenticate(&state.db, &credentials.username, &credentials.password).await?;

    let Some(user) = user else {
        let body = login_page(&credentials.username, Some(LOGIN_FAILED));
        return Ok(layout("Log in", &body).into_response());
    };

    if let Some(previous) = previous {
        sessions::delete_session(&state.db, &previous.session_key).await?;
    }

    let session =
        sessions::create_session(&state.db, user.id, state.config.session_ttl_seconds).await?;
    users::record_login(&state.db, user.id).await?;
    info!("User {} logged in", user.id);

    let cookie = session_cookie(&state.config, &session.session_key);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

/// GET|POST /logout/
///
/// Safe to call without a session.
pub async fn logout(State(state): State<AppState>, session: Option<SessionContext>) -> PageResult {
    if let Some(session) = session {
        sessions::delete_session(&state.db, &session.session_key).await?;
        info!("User {} logged out", session.user.id);
    }

    let cookie = removal_cookie(&state.config);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
