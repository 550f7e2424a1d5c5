//! Landing redirect and the wrapper page around the analytical application

use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use shiny_common::groups;

use super::{attr, layout, PageResult};
use crate::auth::SessionContext;
use crate::AppState;

/// Path of the wrapper page
pub const WRAPPER_PATH: &str = "/dams_mcda_wrapper/";
pub const LOGIN_PATH: &str = "/login/";

/// GET /
pub async fn landing_page(session: Option<SessionContext>) -> Redirect {
    match session {
        Some(_) => Redirect::to(WRAPPER_PATH),
        None => Redirect::to(LOGIN_PATH),
    }
}

/// GET /dams_mcda_wrapper/
///
/// Embeds the application in an iframe named `shiny-dams-mcda` and exposes
/// username, group name and session key as data attributes for
/// `shiny-app-wrapper.js` to pass into the frame.
pub async fn shiny_app_wrapper(
    State(state): State<AppState>,
    session: Option<SessionContext>,
) -> PageResult {
    let Some(session) = session else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let group_name = match session.user.group_id {
        Some(id) => groups::get_group(&state.db, id)
            .await?
            .map(|group| group.name)
            .unwrap_or_default(),
        None => String::new(),
    };

    let body = format!(
        r#"<div id="dams-mcda-username" data-username="{username}"></div>
<div id="dams-mcda-groupname" data-groupname="{group}"></div>
<div id="dams-mcda-session" data-session="{session}"></div>
<p><a href="/logout/">Log out</a></p>
<iframe name="shiny-dams-mcda" id="shiny-dams-mcda" src="{src}" style="width: 100%; height: 90vh; border: none;"></iframe>
<script src="/static/js/shiny-app-wrapper.js"></script>"#,
        username = attr(&session.user.username),
        group = attr(&group_name),
        session = attr(&session.session_key),
        src = attr(&state.config.shiny_app_url),
    );

    Ok(layout("Dams MCDA", &body).into_response())
}
