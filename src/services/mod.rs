//! Contracts for the backend collaborators this engine consumes. Shapes only;
//! the HTTP transport lives in `http`.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::hold::{SoldTicketsEntry, TicketHold};
use crate::models::purchase::PurchaseRequest;
use crate::utils::error::AppError;

/// The `{success, data, message}` envelope every backend endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldCreateItem {
    pub event_id: String,
    pub event_batch_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_type_id: Option<String>,
    pub quantity: u32,
}

#[async_trait]
pub trait HoldService: Send + Sync {
    /// Creates one hold per requested tuple, returning the backend-assigned
    /// holds.
    async fn create_holds(&self, items: &[HoldCreateItem]) -> Result<Vec<TicketHold>, AppError>;

    /// Updates a hold's quantity. `Ok(false)` means the backend refused the
    /// update; the caller must leave its local state untouched.
    async fn update_hold(&self, hold_id: &str, quantity: u32) -> Result<bool, AppError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCheckData {
    pub id: String,
    pub discount_type: crate::models::coupon::DiscountType,
    pub discount_value: i64,
}

#[async_trait]
pub trait CouponService: Send + Sync {
    async fn check(
        &self,
        code: &str,
        event_id: &str,
    ) -> Result<ServiceEnvelope<CouponCheckData>, AppError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    #[serde(default)]
    pub is_credit_card_error: bool,
    pub pix_data: Option<PixData>,
    #[serde(default)]
    pub confirmed_by_credit_card: bool,
    pub payment_id: Option<String>,
    pub payment_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixData {
    pub qr_code: Option<String>,
    pub copy_paste_code: Option<String>,
    pub expires_at: Option<String>,
}

#[async_trait]
pub trait PurchaseService: Send + Sync {
    async fn submit(
        &self,
        request: &PurchaseRequest,
    ) -> Result<ServiceEnvelope<PurchaseOutcome>, AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub status: String,
}

impl PaymentStatus {
    /// PIX polling stops at the first settled status.
    pub fn is_settled(&self) -> bool {
        matches!(self.status.as_str(), "CONFIRMED" | "RECEIVED")
    }
}

#[async_trait]
pub trait PaymentStatusService: Send + Sync {
    async fn verify(&self, payment_id: &str) -> Result<PaymentStatus, AppError>;
}

#[async_trait]
pub trait SoldTicketsService: Send + Sync {
    async fn sold_tickets(&self, event_id: &str) -> Result<Vec<SoldTicketsEntry>, AppError>;
}
