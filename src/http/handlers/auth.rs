//! Browser sign-in pages.
//!
//! The browser session is independent of the upstream session: the
//! cookie only marks who is using the portal, while upstream sign-on
//! happens per request with the configured service account.

use axum::extract::{Form, State};
use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::response::{IntoResponse, Redirect, Response};
use minijinja::context;
use serde::Deserialize;

use crate::http::cookies;
use crate::http::handlers::{flash_redirect, render_page};
use crate::http::server::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if cookies::user_name(&headers).is_some() {
        return Redirect::to("/home").into_response();
    }
    render_page(&state, &headers, "", "index.html", context! {})
}

pub async fn login(headers: HeaderMap, Form(form): Form<LoginForm>) -> Response {
    if cookies::user_name(&headers).is_some() {
        return Redirect::to("/home").into_response();
    }
    if form.user_name.is_empty() {
        return flash_redirect("/", "Invalid user name or password");
    }

    let mut response = Redirect::to("/home").into_response();
    response.headers_mut().append(
        SET_COOKIE,
        cookies::set(cookies::USER_COOKIE, &form.user_name),
    );
    response
}

pub async fn logout() -> Response {
    let mut response = Redirect::to("/").into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::clear(cookies::USER_COOKIE));
    response
}

pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match crate::http::handlers::require_user(&headers) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    render_page(&state, &headers, &user, "home.html", context! {})
}
