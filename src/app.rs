use crate::state;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};

mod accounts;
mod corrections;
mod diaries;
mod entries;
mod explore;
mod session;

pub fn app(state: state::AppState) -> Router {
    Router::new()
        .route("/api/register", post(accounts::register))
        .route("/api/login", post(accounts::login))
        .route("/api/logout", post(accounts::logout))
        .route("/api/me", get(accounts::me))
        .route("/api/me/username", put(accounts::update_username))
        .route(
            "/api/diary",
            get(diaries::own_diary).put(diaries::update_diary),
        )
        .route("/api/entries", post(entries::create_entry))
        .route(
            "/api/entries/{entry}",
            put(entries::update_entry).delete(entries::delete_entry),
        )
        .route(
            "/api/entries/{entry}/correction",
            get(corrections::my_correction).put(corrections::save_correction),
        )
        .route(
            "/api/entries/{entry}/corrections",
            get(corrections::list_corrections),
        )
        .route(
            "/api/entries/{entry}/corrections/{correction}/read",
            post(corrections::mark_correction_read),
        )
        .route("/api/diaries/{diary}", get(diaries::view_diary))
        .route(
            "/api/diaries/{diary}/subscribe",
            post(diaries::subscribe).delete(diaries::unsubscribe),
        )
        .route(
            "/api/diaries/{diary}/requests",
            post(diaries::request_subscription).get(diaries::list_requests),
        )
        .route(
            "/api/diaries/{diary}/requests/{req}/approve",
            post(diaries::approve_request),
        )
        .route(
            "/api/diaries/{diary}/requests/{req}/reject",
            post(diaries::reject_request),
        )
        .route(
            "/api/diaries/{diary}/subscribers",
            get(diaries::list_subscribers),
        )
        .route(
            "/api/diaries/{diary}/subscribers/{user}",
            delete(diaries::remove_subscriber),
        )
        .route(
            "/api/diaries/{diary}/entries/{entry}/like",
            post(entries::toggle_like),
        )
        .route(
            "/api/diaries/{diary}/entries/{entry}/comments",
            post(entries::add_comment),
        )
        .route(
            "/api/diaries/{diary}/entries/{entry}/comments/{comment}",
            delete(entries::delete_comment),
        )
        .route("/api/subscriptions", get(diaries::list_subscriptions))
        .route("/api/explore/search", get(explore::search))
        .route("/api/explore/trending", get(explore::trending))
        .route("/health", get(health))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state,
            session::session_middleware,
        ))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
