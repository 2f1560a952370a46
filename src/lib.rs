use std::net::SocketAddr;

pub mod adapters;
mod app;
pub mod config;
pub mod countdown;
pub mod ledger;
pub mod milestone;
pub mod ports;
pub mod push;
pub mod state;
pub mod store;
pub mod types;

pub use app::app;
pub use push::vapid::{VapidCredentials, generate_vapid_credentials};

pub async fn serve(addr: SocketAddr, config: config::AppConfig) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app(config)).await.expect("server error");
}
