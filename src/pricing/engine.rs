//! Derivation of per-line and aggregate totals from cart lines plus fetched
//! event metadata. Pure given its inputs; all amounts are integer cents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::cart::CartLine;
use crate::models::coupon::AppliedCoupon;
use crate::models::event::{EventBatch, EventSnapshot};
use crate::models::payment::PaymentMethod;
use crate::pricing::identity::line_identifier;
use crate::pricing::money::apply_bps;
use crate::utils::error::AppError;

/// Tunable pricing rules. Production defaults via `Default`; tests and future
/// product changes swap values without touching the math.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Fee in basis points added per installment beyond the first.
    pub installment_step_bps: i64,
    /// Hard cap on installments regardless of subtotal or event settings.
    pub installment_cap: u32,
    /// One installment is allowed per this many cents of subtotal.
    pub cents_per_installment: i64,
    /// Below this subtotal the insurance premium is flat.
    pub insurance_threshold_cents: i64,
    pub insurance_flat_fee_cents: i64,
    /// Premium rate at or above the threshold, in basis points.
    pub insurance_rate_bps: i64,
    /// Per-tuple purchase limit when the event does not set its own.
    pub default_buy_limit: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            installment_step_bps: 150,
            installment_cap: 12,
            cents_per_installment: 1_000,
            insurance_threshold_cents: 10_000,
            insurance_flat_fee_cents: 500,
            insurance_rate_bps: 500,
            default_buy_limit: 10,
        }
    }
}

/// Everything the engine needs to price a cart. Coupons are keyed by event id.
#[derive(Debug, Clone)]
pub struct PricingInput<'a> {
    pub cart: &'a [CartLine],
    pub events: &'a [EventSnapshot],
    pub coupons: &'a HashMap<String, AppliedCoupon>,
    pub payment_method: PaymentMethod,
    pub installments: u32,
    pub is_insured: bool,
}

/// Per-selection price breakdown, keyed by the line identifier the UI uses
/// for its quantity inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTotal {
    pub identifier: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuote {
    /// One total per cart line, in cart order.
    pub line_totals: Vec<i64>,
    /// Per-selection breakdown; multi-day aggregates expand to one entry per
    /// represented day with the disambiguated identifier.
    pub selection_totals: Vec<SelectionTotal>,
    pub subtotal_before_discount: i64,
    pub total_discount: i64,
    pub subtotal: i64,
    pub installment_fee: i64,
    pub insurance_premium: i64,
    pub grand_total: i64,
    /// Upper bound after both the subtotal threshold and the event cap.
    pub allowed_installments: u32,
    /// The selected count, deterministically reduced when it exceeded the
    /// allowed bound.
    pub installments: u32,
}

fn find_event<'a>(events: &'a [EventSnapshot], event_id: &str) -> Result<&'a EventSnapshot, AppError> {
    events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' not in snapshot set", event_id)))
}

/// Unit price for one selection, in cents. Resolution order: per-batch
/// per-ticket-type override, then batch flat price, then the event's legacy
/// flat price. Free events always price at zero.
fn unit_price(
    ticket_type_id: Option<&str>,
    event: &EventSnapshot,
    batch: Option<&EventBatch>,
) -> i64 {
    if event.is_free {
        return 0;
    }
    if let (Some(batch), Some(ticket_type_id)) = (batch, ticket_type_id) {
        if let Some(price) = batch.ticket_type_price(ticket_type_id) {
            return price;
        }
    }
    if let Some(price) = batch.and_then(|b| b.price) {
        return price;
    }
    event.price
}

/// Total for one cart line: per-selection `unit × quantity`, or the flat
/// quantity when the line carries no ticket types.
pub fn item_total(line: &CartLine, event: &EventSnapshot) -> i64 {
    if line.is_free || event.is_free {
        return 0;
    }
    let batch = event.batch(&line.batch_id);

    if line.ticket_types.is_empty() {
        return unit_price(None, event, batch) * i64::from(line.quantity);
    }

    line.ticket_types
        .iter()
        .map(|sel| {
            unit_price(sel.ticket_type_id.as_deref(), event, batch) * i64::from(sel.quantity)
        })
        .sum()
}

/// Installment fee for a credit purchase: zero in cash, an escalating
/// percentage of the subtotal otherwise. Monotonic in the installment count.
pub fn installment_fee(subtotal: i64, installments: u32, config: &PricingConfig) -> i64 {
    if installments <= 1 || subtotal <= 0 {
        return 0;
    }
    let steps = i64::from(installments.min(config.installment_cap) - 1);
    apply_bps(subtotal, steps * config.installment_step_bps)
}

/// Insurance premium: zero when not insured or the purchase is free; a flat
/// fee below the threshold, a percentage of the subtotal at or above it.
pub fn insurance_premium(
    subtotal: i64,
    is_insured: bool,
    is_free: bool,
    config: &PricingConfig,
) -> i64 {
    if !is_insured || is_free || subtotal <= 0 {
        return 0;
    }
    if subtotal < config.insurance_threshold_cents {
        config.insurance_flat_fee_cents
    } else {
        apply_bps(subtotal, config.insurance_rate_bps)
    }
}

/// Highest installment count this subtotal and event admit.
pub fn allowed_installments(subtotal: i64, event_max: Option<u32>, config: &PricingConfig) -> u32 {
    let by_subtotal = if config.cents_per_installment > 0 {
        (subtotal / config.cents_per_installment).clamp(1, i64::from(config.installment_cap)) as u32
    } else {
        config.installment_cap
    };
    by_subtotal.min(event_max.unwrap_or(u32::MAX)).max(1)
}

/// Reduces a selected installment count to the allowed bound. Never keeps an
/// invalid value.
pub fn clamp_installments(selected: u32, allowed: u32) -> u32 {
    selected.clamp(1, allowed)
}

/// Validates a requested quantity against the sold floor and the per-event
/// purchase limit. Below-sold requests are rejected so the caller can revert
/// the field and notify the user; over-limit requests clamp down.
pub fn check_quantity(
    requested: u32,
    sold: u32,
    event: &EventSnapshot,
    config: &PricingConfig,
) -> Result<u32, AppError> {
    if requested < sold {
        return Err(AppError::QuantityBelowSold { requested, sold });
    }
    let limit = event.buy_tickets_limit.unwrap_or(config.default_buy_limit);
    Ok(requested.max(1).min(limit.max(sold.max(1))))
}

/// Per-selection breakdown for one line, expanding multi-day aggregates into
/// one entry per represented day.
fn selection_breakdown(line: &CartLine, event: &EventSnapshot, out: &mut Vec<SelectionTotal>) {
    let batch = event.batch(&line.batch_id);
    for selection in &line.ticket_types {
        let unit = if line.is_free {
            0
        } else {
            unit_price(selection.ticket_type_id.as_deref(), event, batch)
        };
        let disambiguate = selection.is_multi_day_aggregate();
        if selection.days.is_empty() {
            out.push(SelectionTotal {
                identifier: line_identifier(selection, None, false),
                quantity: selection.quantity,
                unit_price: unit,
                total: unit * i64::from(selection.quantity),
            });
        } else {
            for day in &selection.days {
                out.push(SelectionTotal {
                    identifier: line_identifier(selection, Some(day), disambiguate),
                    quantity: selection.quantity,
                    unit_price: unit,
                    total: unit * i64::from(selection.quantity),
                });
            }
        }
    }
}

/// Prices the whole cart. Pure: same inputs, same quote.
pub fn quote(input: &PricingInput<'_>, config: &PricingConfig) -> Result<PricingQuote, AppError> {
    let mut line_totals = Vec::with_capacity(input.cart.len());
    let mut selection_totals = Vec::new();
    let mut per_event_subtotal: HashMap<&str, i64> = HashMap::new();
    let mut event_max: Option<u32> = None;
    let mut all_free = !input.cart.is_empty();

    for line in input.cart {
        let event = find_event(input.events, &line.event_id)?;
        let total = item_total(line, event);
        line_totals.push(total);
        selection_breakdown(line, event, &mut selection_totals);
        *per_event_subtotal.entry(event.id.as_str()).or_default() += total;
        all_free &= line.is_free || event.is_free;
        // tightest event cap present in the cart bounds the whole purchase
        event_max = match (event_max, event.max_installments) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    let subtotal_before_discount: i64 = line_totals.iter().sum();

    // expressed per event so multi-event carts need no change
    let total_discount: i64 = per_event_subtotal
        .iter()
        .map(|(event_id, &subtotal)| {
            input
                .coupons
                .get(*event_id)
                .map_or(0, |coupon| coupon.discount_on(subtotal))
        })
        .sum();

    let subtotal = subtotal_before_discount - total_discount;

    let allowed = allowed_installments(subtotal, event_max, config);
    let installments = clamp_installments(input.installments, allowed);

    let fee = if input.payment_method == PaymentMethod::Credit {
        installment_fee(subtotal, installments, config)
    } else {
        0
    };

    let premium = insurance_premium(subtotal, input.is_insured, all_free, config);

    Ok(PricingQuote {
        line_totals,
        selection_totals,
        subtotal_before_discount,
        total_discount,
        subtotal,
        installment_fee: fee,
        insurance_premium: premium,
        grand_total: subtotal + fee + premium,
        allowed_installments: allowed,
        installments,
    })
}
