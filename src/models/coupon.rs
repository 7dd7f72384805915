use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// A validated coupon applied to one event. At most one per event at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub id: String,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage points for `Percentage`, cents for `Fixed`.
    pub discount_value: i64,
}

impl AppliedCoupon {
    /// Discount in cents against a discountable subtotal. Never exceeds the
    /// subtotal and never goes negative.
    pub fn discount_on(&self, subtotal: i64) -> i64 {
        if subtotal <= 0 {
            return 0;
        }
        match self.discount_type {
            DiscountType::Percentage => {
                // round half-up on the cents value
                ((subtotal * self.discount_value + 50) / 100).clamp(0, subtotal)
            }
            DiscountType::Fixed => self.discount_value.clamp(0, subtotal),
        }
    }
}
