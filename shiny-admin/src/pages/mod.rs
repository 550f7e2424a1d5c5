//! Server-rendered pages: landing redirect, wrapper, sign-up, login/logout
//! and the password reset flow
//!
//! Pages are small enough to build as strings; every interpolated value goes
//! through `html_escape`.

use std::borrow::Cow;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use shiny_common::FieldErrors;
use tracing::error;

use crate::AppState;

pub mod account;
pub mod landing;
pub mod password_reset;

const WRAPPER_JS: &str = include_str!("../../ui/shiny-app-wrapper.js");

/// Failure while rendering a page; shown as a bare 500
#[derive(Debug)]
pub struct PageError(shiny_common::Error);

impl From<shiny_common::Error> for PageError {
    fn from(err: shiny_common::Error) -> Self {
        PageError(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!("Page failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Server Error (500)</h1>".to_string()),
        )
            .into_response()
    }
}

pub type PageResult = Result<Response, PageError>;

pub(crate) fn text(value: &str) -> Cow<'_, str> {
    html_escape::encode_text(value)
}

pub(crate) fn attr(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

/// Full HTML document around `body`
pub(crate) fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        text(title),
        body
    ))
}

pub(crate) fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", text(m)))
        .collect();
    format!("<ul class=\"errorlist\">{}</ul>", items)
}

/// One labelled `<input>`; password inputs never echo a value
pub(crate) fn input(label: &str, name: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    let value = if kind == "password" { "" } else { value };
    let messages = errors.get(name).map(Vec::as_slice).unwrap_or_default();

    format!(
        "<p>{errors}<label for=\"id_{name}\">{label}</label> <input type=\"{kind}\" name=\"{name}\" id=\"id_{name}\" value=\"{value}\"></p>",
        errors = error_list(messages),
        name = attr(name),
        label = text(label),
        kind = attr(kind),
        value = attr(value),
    )
}

/// POST form wrapping already-rendered fields
pub(crate) fn form(action: &str, fields: &str, submit: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\">\n{}\n<button type=\"submit\">{}</button>\n</form>",
        attr(action),
        fields,
        text(submit)
    )
}

/// GET /static/js/shiny-app-wrapper.js
pub async fn serve_wrapper_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        WRAPPER_JS,
    )
        .into_response()
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(landing::landing_page))
        .route("/dams_mcda_wrapper/", get(landing::shiny_app_wrapper))
        .route("/static/js/shiny-app-wrapper.js", get(serve_wrapper_js))
        .route("/register/", get(account::register_form).post(account::register))
        .route("/login/", get(account::login_form).post(account::login))
        .route("/logout/", get(account::logout).post(account::logout))
        .route(
            "/password_reset/",
            get(password_reset::request_form).post(password_reset::request_reset),
        )
        .route("/password_reset/done/", get(password_reset::done))
        .route(
            "/password_reset/confirm/:uid/:token/",
            get(password_reset::confirm_form).post(password_reset::confirm),
        )
        .route("/password_reset/complete/", get(password_reset::complete))
}
