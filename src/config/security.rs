use axum::http::HeaderValue;
use axum::Router;
use std::env;
use tower_http::set_header::SetResponseHeaderLayer;

/// Security header names and values
const X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
const X_FRAME_OPTIONS: &str = "X-Frame-Options";
const STRICT_TRANSPORT_SECURITY: &str = "Strict-Transport-Security";
const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
const REFERRER_POLICY: &str = "Referrer-Policy";

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";

fn is_production() -> bool {
    env::var("RUST_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false)
}

fn header_layer(
    name: &'static str,
    value: &'static str,
) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        name.parse().expect("static header name"),
        HeaderValue::from_static(value),
    )
}

/// Stamps the API security headers on every response. HSTS only in
/// production, where HTTPS is guaranteed.
pub fn apply_security_headers(router: Router) -> Router {
    let router = router
        .layer(header_layer(X_CONTENT_TYPE_OPTIONS, NOSNIFF))
        .layer(header_layer(X_FRAME_OPTIONS, DENY))
        .layer(header_layer(CONTENT_SECURITY_POLICY, CSP_API_VALUE))
        .layer(header_layer(REFERRER_POLICY, REFERRER_POLICY_VALUE));

    if is_production() {
        tracing::info!("Security: HSTS header enabled (production mode)");
        router.layer(header_layer(STRICT_TRANSPORT_SECURITY, HSTS_VALUE))
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
        router
    }
}
