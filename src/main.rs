use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use bilheteria_checkout::checkout::session::CheckoutServices;
use bilheteria_checkout::config::Config;
use bilheteria_checkout::routes::{create_routes, AppState};
use bilheteria_checkout::services::http::BackendClient;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let backend = Arc::new(BackendClient::new(
        reqwest::Client::new(),
        config.backend_base_url.clone(),
    ));
    tracing::info!(base_url = %config.backend_base_url, "Backend client configured");

    let services = CheckoutServices {
        holds: backend.clone(),
        coupons: backend.clone(),
        purchases: backend.clone(),
        payment_status: backend.clone(),
        sold_tickets: backend,
    };

    let app: Router = create_routes(AppState::new(services));

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .expect("BIND_ADDR must be a valid socket address");
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
