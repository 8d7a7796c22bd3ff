pub mod accounts;
pub mod adapters;
pub mod app;
pub mod auth;
pub mod config;
pub mod corrections;
pub mod entries;
pub mod error;
pub mod explore;
pub mod notifications;
pub mod ports;
pub mod state;
pub mod subscriptions;
pub mod types;

pub use app::app;
pub use state::AppState;

use std::net::SocketAddr;

pub async fn serve(addr: SocketAddr, state: AppState) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app(state)).await.expect("server error");
}
