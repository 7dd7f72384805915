use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::change_risk::{detect_changes, risk_score, ChangeItem};
use crate::checkout::payload::SellerContext;
use crate::checkout::session::CheckoutSession;
use crate::models::cart::CartLine;
use crate::models::coupon::AppliedCoupon;
use crate::models::event::EventSnapshot;
use crate::models::form::{AnswerKey, AnswerSheet, AnswerValue, FieldKind, FormAnswer};
use crate::models::payment::{CardSelection, PaymentMethod};
use crate::pricing::engine::{quote, PricingInput, PricingQuote};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// How long a one-shot checkout session may live before the cart expiry timer
/// (owned by the caller) is expected to fire.
const SESSION_TTL_MINUTES: i64 = 15;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "bilheteria-checkout",
    };

    success(payload, "Health check successful").into_response()
}

fn default_installments() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub cart: Vec<CartLine>,
    pub events: Vec<EventSnapshot>,
    /// Applied coupons keyed by event id.
    #[serde(default)]
    pub coupons: HashMap<String, AppliedCoupon>,
    pub payment_method: PaymentMethod,
    #[serde(default = "default_installments")]
    pub installments: u32,
    #[serde(default)]
    pub is_insured: bool,
}

/// Prices a cart without touching any backend service.
pub async fn quote_cart(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Response, AppError> {
    if request.cart.is_empty() {
        return Err(AppError::ValidationError("Cart is empty".into()));
    }

    let result: PricingQuote = quote(
        &PricingInput {
            cart: &request.cart,
            events: &request.events,
            coupons: &request.coupons,
            payment_method: request.payment_method,
            installments: request.installments,
            is_insured: request.is_insured,
        },
        &state.pricing,
    )?;

    Ok(success(result, "Cart priced").into_response())
}

/// One stored answer as the client ships it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnswer {
    pub event_id: String,
    #[serde(default)]
    pub ticket_number: u32,
    pub kind: FieldKind,
    pub order: u32,
    pub label: String,
    pub answer: AnswerValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRef {
    pub code: String,
    pub event_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub cart: Vec<CartLine>,
    pub events: Vec<EventSnapshot>,
    #[serde(default)]
    pub answers: Vec<WireAnswer>,
    #[serde(default)]
    pub coupons: Vec<CouponRef>,
    pub payment_method: PaymentMethod,
    #[serde(default = "default_installments")]
    pub installments: u32,
    #[serde(default)]
    pub is_insured: bool,
    pub card: Option<CardSelection>,
    pub seller: Option<SellerContext>,
}

fn answer_sheet(answers: Vec<WireAnswer>) -> AnswerSheet {
    answers
        .into_iter()
        .map(|a| {
            (
                AnswerKey {
                    event_id: a.event_id,
                    ticket_number: a.ticket_number,
                    kind: a.kind,
                    order: a.order,
                },
                FormAnswer {
                    label: a.label,
                    answer: a.answer,
                },
            )
        })
        .collect()
}

/// Runs a whole one-shot checkout: reserve inventory, validate coupons,
/// build the purchase request and submit it. The outcome shape tells the
/// caller whether to show a confirmation, a PIX code or a card error.
pub async fn finalize_checkout(
    State(state): State<AppState>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Response, AppError> {
    if request.cart.is_empty() {
        return Err(AppError::ValidationError("Cart is empty".into()));
    }

    let mut session = CheckoutSession::new(
        state.services.clone(),
        request.cart,
        request.events,
        Utc::now() + Duration::minutes(SESSION_TTL_MINUTES),
    );
    session.payment_method = request.payment_method;
    session.installments = request.installments;
    session.is_insured = request.is_insured;
    session.card = request.card;
    session.answers = answer_sheet(request.answers);

    session.enter(true).await;

    for coupon in &request.coupons {
        session.apply_coupon(&coupon.code, &coupon.event_id).await?;
    }

    let outcome = session.finalize(request.seller.as_ref()).await?;

    Ok(success(outcome, "Purchase submitted").into_response())
}

/// One manual PIX status check. The caller drives the poll cadence and stops
/// at the first settled status.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Response, AppError> {
    let status = state.services.payment_status.verify(&payment_id).await?;
    Ok(success(status, "Payment status fetched").into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRiskRequest {
    pub original: EventSnapshot,
    pub proposed: EventSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRiskPayload {
    pub changes: Vec<ChangeItem>,
    pub risk_score: u32,
}

/// Scores a proposed event edit against its original snapshot.
pub async fn assess_change_risk(
    State(state): State<AppState>,
    Json(request): Json<ChangeRiskRequest>,
) -> Result<Response, AppError> {
    if request.original.id != request.proposed.id {
        return Err(AppError::ValidationError(
            "Original and proposed snapshots must describe the same event".into(),
        ));
    }

    let changes = detect_changes(&request.original, &request.proposed, &state.risk_table);
    let score = risk_score(&changes, &state.risk_table);

    Ok(success(
        ChangeRiskPayload {
            changes,
            risk_score: score,
        },
        "Change risk assessed",
    )
    .into_response())
}
