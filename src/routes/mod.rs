use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::admin::change_risk::RiskRuleTable;
use crate::checkout::session::CheckoutServices;
use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::{
    assess_change_risk, finalize_checkout, health_check, payment_status, quote_cart,
};
use crate::pricing::engine::PricingConfig;

#[derive(Clone)]
pub struct AppState {
    pub pricing: PricingConfig,
    pub risk_table: RiskRuleTable,
    pub services: CheckoutServices,
}

impl AppState {
    pub fn new(services: CheckoutServices) -> Self {
        Self {
            pricing: PricingConfig::default(),
            risk_table: RiskRuleTable::default(),
            services,
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/checkout/quote", post(quote_cart))
        .route("/checkout/finalize", post(finalize_checkout))
        .route("/checkout/payments/:payment_id/status", get(payment_status))
        .route("/admin/change-risk", post(assess_change_risk))
        .with_state(state);

    apply_security_headers(router).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer()),
    )
}
