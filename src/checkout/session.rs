//! One buyer's checkout from entry to payment. Single-threaded and
//! event-driven: every network call is a suspension point, and shared state
//! (cart, coupons, holds) mutates only after its triggering call succeeds.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::checkout::holds::HoldCoordinator;
use crate::checkout::payload::{build_purchase_request, PayloadInput, SellerContext};
use crate::checkout::steps::{CheckoutStep, CheckoutSteps, StepContext};
use crate::models::cart::CartLine;
use crate::models::coupon::AppliedCoupon;
use crate::models::event::EventSnapshot;
use crate::models::form::{parse_form_schema, required_answers_complete, AnswerSheet};
use crate::models::hold::{sold_quantity, SoldTicketsEntry};
use crate::models::payment::{CardSelection, PaymentMethod};
use crate::pricing::engine::{check_quantity, quote, PricingConfig, PricingInput, PricingQuote};
use crate::pricing::identity::resolve_active_date;
use crate::services::{
    CouponService, HoldService, PaymentStatus, PaymentStatusService, PixData, PurchaseService,
    SoldTicketsService,
};
use crate::utils::error::AppError;

/// The backend collaborators a session talks to.
#[derive(Clone)]
pub struct CheckoutServices {
    pub holds: Arc<dyn HoldService>,
    pub coupons: Arc<dyn CouponService>,
    pub purchases: Arc<dyn PurchaseService>,
    pub payment_status: Arc<dyn PaymentStatusService>,
    pub sold_tickets: Arc<dyn SoldTicketsService>,
}

/// Where a finalize call landed.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CheckoutOutcome {
    #[serde(rename_all = "camelCase")]
    Confirmed {
        payment_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    PixPending {
        payment_id: Option<String>,
        pix: PixData,
    },
    /// Seller-link checkout stops here without redirecting.
    #[serde(rename_all = "camelCase")]
    PaymentLink {
        payment_code: Option<String>,
    },
    /// Soft failure inside a successful response; a distinct branch, not an
    /// error.
    CreditCardError {
        message: String,
    },
}

pub struct CheckoutSession {
    id: String,
    services: CheckoutServices,
    holds: HoldCoordinator,
    steps: CheckoutSteps,
    config: PricingConfig,

    cart: Vec<CartLine>,
    events: Vec<EventSnapshot>,
    coupons: HashMap<String, AppliedCoupon>,
    sold: Vec<SoldTicketsEntry>,
    pub answers: AnswerSheet,

    pub payment_method: PaymentMethod,
    pub installments: u32,
    pub is_insured: bool,
    pub card: Option<CardSelection>,

    expires_at: DateTime<Utc>,
    cleared: bool,
}

impl CheckoutSession {
    pub fn new(
        services: CheckoutServices,
        cart: Vec<CartLine>,
        events: Vec<EventSnapshot>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let holds = HoldCoordinator::new(services.holds.clone());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            services,
            holds,
            steps: CheckoutSteps::new(),
            config: PricingConfig::default(),
            cart,
            events,
            coupons: HashMap::new(),
            sold: Vec::new(),
            answers: AnswerSheet::new(),
            payment_method: PaymentMethod::Pix,
            installments: 1,
            is_insured: false,
            card: None,
            expires_at,
            cleared: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Session/cart expiry is enforced externally; the session only exposes
    /// the timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    pub fn applied_coupons(&self) -> &HashMap<String, AppliedCoupon> {
        &self.coupons
    }

    pub fn current_step(&self) -> CheckoutStep {
        self.steps.current()
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Checkout entry: load the sold snapshot and reserve inventory.
    /// Both are best-effort; neither failure blocks the wizard.
    pub async fn enter(&mut self, authenticated: bool) {
        for event in &self.events {
            match self.services.sold_tickets.sold_tickets(&event.id).await {
                Ok(entries) => self.sold.extend(entries),
                Err(e) => warn!(event_id = %event.id, error = %e, "Sold-tickets fetch failed"),
            }
        }

        let cart = self.cart.clone();
        for event in self.events.clone() {
            if let Err(e) = self.holds.ensure_holds(&cart, &event, authenticated).await {
                warn!(event_id = %event.id, error = %e, "Hold creation failed");
            }
        }
    }

    pub fn quote(&self) -> Result<PricingQuote, AppError> {
        let q = quote(
            &PricingInput {
                cart: &self.cart,
                events: &self.events,
                coupons: &self.coupons,
                payment_method: self.payment_method,
                installments: self.installments,
                is_insured: self.is_insured,
            },
            &self.config,
        )?;
        Ok(q)
    }

    /// Validates a coupon with the backend and applies it to the event. The
    /// applied-coupon map changes only on a successful check; one coupon per
    /// event, the newest replacing the old.
    pub async fn apply_coupon(
        &mut self,
        code: &str,
        event_id: &str,
    ) -> Result<AppliedCoupon, AppError> {
        let envelope = self.services.coupons.check(code, event_id).await?;
        let data = match (envelope.success, envelope.data) {
            (true, Some(data)) => data,
            _ => {
                return Err(AppError::UpstreamRejected(
                    envelope.message.unwrap_or_else(|| "Invalid coupon".into()),
                ))
            }
        };

        let coupon = AppliedCoupon {
            id: data.id,
            code: code.to_string(),
            discount_type: data.discount_type,
            discount_value: data.discount_value,
        };
        self.coupons.insert(event_id.to_string(), coupon.clone());

        // a smaller subtotal can shrink the allowed installment count
        if let Ok(q) = self.quote() {
            self.installments = q.installments;
        }

        Ok(coupon)
    }

    /// Changes the quantity of one line (or one of its selections). Order of
    /// operations per the reservation protocol: validate locally, update the
    /// backend hold, and only then mutate the cart. Any failure leaves the
    /// cart exactly as it was.
    pub async fn set_quantity(
        &mut self,
        line_index: usize,
        selection_index: Option<usize>,
        day: Option<&str>,
        requested: u32,
    ) -> Result<u32, AppError> {
        let line = self
            .cart
            .get(line_index)
            .ok_or_else(|| AppError::NotFound("Cart line not found".into()))?;
        let event = self
            .events
            .iter()
            .find(|e| e.id == line.event_id)
            .ok_or_else(|| AppError::NotFound("Event not in snapshot set".into()))?;

        let ticket_type_id = match selection_index {
            Some(i) => line
                .ticket_types
                .get(i)
                .ok_or_else(|| AppError::NotFound("Ticket type selection not found".into()))?
                .ticket_type_id
                .clone(),
            None => None,
        };
        let resolved_date = resolve_active_date(event, day);
        let batch_id = line.batch_id.clone();

        let sold = sold_quantity(
            &self.sold,
            &batch_id,
            resolved_date.as_deref(),
            ticket_type_id.as_deref(),
        );
        let validated = check_quantity(requested, sold, event, &self.config)?;

        let hold_id = self
            .holds
            .find_hold_id(resolved_date.as_deref(), ticket_type_id.as_deref());
        if !hold_id.is_empty()
            && !self.holds.update_hold_quantity(&hold_id, validated).await
        {
            return Err(AppError::UpstreamRejected(
                "Could not update the ticket reservation".into(),
            ));
        }

        let line = &mut self.cart[line_index];
        match selection_index {
            Some(i) => line.ticket_types[i].quantity = validated,
            None => line.quantity = validated,
        }

        // re-clamp installments against the new subtotal
        if let Ok(q) = self.quote() {
            self.installments = q.installments;
        }

        Ok(validated)
    }

    fn total_quantity_for(&self, event_id: &str) -> u32 {
        self.cart
            .iter()
            .filter(|l| l.event_id == event_id)
            .map(CartLine::effective_quantity)
            .sum()
    }

    fn form_answers_complete(&self) -> bool {
        self.events.iter().all(|event| {
            let Some(raw) = event.form.as_deref() else {
                return true;
            };
            let Ok(schema) = parse_form_schema(raw) else {
                return true;
            };
            required_answers_complete(
                &schema,
                &self.answers,
                &event.id,
                self.total_quantity_for(&event.id),
                event.is_form_for_each_ticket,
            )
        })
    }

    /// Builds the gate context for a transition attempt.
    pub fn step_context(
        &self,
        authenticated: bool,
        profile_complete: bool,
        seller_mode: bool,
        customer_ready: bool,
    ) -> StepContext {
        StepContext {
            authenticated,
            profile_complete,
            seller_mode,
            customer_ready,
            has_custom_form: self.events.iter().any(EventSnapshot::has_form),
            form_answers_complete: self.form_answers_complete(),
        }
    }

    pub fn advance_step(&mut self, ctx: &StepContext) -> Result<CheckoutStep, AppError> {
        self.steps.next(ctx)
    }

    pub fn previous_step(&mut self, ctx: &StepContext) -> CheckoutStep {
        self.steps.previous(ctx)
    }

    /// Submits the purchase. The single gating call: the outcome decides the
    /// terminal state, and nothing is mutated until the response arrives.
    pub async fn finalize(
        &mut self,
        seller: Option<&SellerContext>,
    ) -> Result<CheckoutOutcome, AppError> {
        let coupon_codes: Vec<String> =
            self.coupons.values().map(|c| c.code.clone()).collect();

        let request = build_purchase_request(PayloadInput {
            cart: &self.cart,
            events: &self.events,
            answers: &self.answers,
            coupon_codes: &coupon_codes,
            payment_method: self.payment_method,
            card: self.card.as_ref(),
            installments: self.installments,
            is_insured: self.is_insured,
            hold_ids: self.holds.hold_ids(),
            seller,
        })?;

        let envelope = self.services.purchases.submit(&request).await?;
        if !envelope.success {
            return Err(AppError::UpstreamRejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Purchase was rejected".into()),
            ));
        }
        let data = envelope
            .data
            .ok_or_else(|| AppError::MalformedResponse("Purchase response without data".into()))?;

        if data.is_credit_card_error {
            return Ok(CheckoutOutcome::CreditCardError {
                message: envelope
                    .message
                    .unwrap_or_else(|| "Card was declined".into()),
            });
        }

        if data.confirmed_by_credit_card {
            self.clear();
            return Ok(CheckoutOutcome::Confirmed {
                payment_id: data.payment_id,
            });
        }

        if let Some(pix) = data.pix_data {
            return Ok(CheckoutOutcome::PixPending {
                payment_id: data.payment_id,
                pix,
            });
        }

        if self.payment_method == PaymentMethod::Link {
            return Ok(CheckoutOutcome::PaymentLink {
                payment_code: data.payment_code,
            });
        }

        Err(AppError::MalformedResponse(
            "Purchase response carried no recognizable outcome".into(),
        ))
    }

    /// Marks the session paid: the cart empties and any PIX poll must stop.
    pub fn clear(&mut self) {
        self.cleared = true;
        self.cart.clear();
        self.coupons.clear();
    }
}

/// Polls payment status at a fixed interval until the payment settles or the
/// caller cancels. Transient verification failures keep the poll alive.
pub async fn poll_payment_status(
    service: Arc<dyn PaymentStatusService>,
    payment_id: String,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) -> Option<PaymentStatus> {
    if *cancel.borrow() {
        return None;
    }
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service.verify(&payment_id).await {
                    Ok(status) if status.is_settled() => return Some(status),
                    Ok(_) => {}
                    Err(e) => warn!(payment_id = %payment_id, error = %e, "Payment status check failed"),
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    return None;
                }
            }
        }
    }
}
