//! reqwest-backed implementations of the backend service contracts.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::models::hold::{SoldTicketsEntry, TicketHold};
use crate::models::purchase::PurchaseRequest;
use crate::services::{
    CouponCheckData, CouponService, HoldCreateItem, HoldService, PaymentStatus,
    PaymentStatusService, PurchaseOutcome, PurchaseService, ServiceEnvelope, SoldTicketsService,
};
use crate::utils::error::AppError;

/// Client for the ticketing backend. One instance serves all five contracts.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<ServiceEnvelope<T>, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        debug!(%path, %status, "Backend call");
        let envelope = response
            .json::<ServiceEnvelope<T>>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("{} from {}", e, path)))?;
        Ok(envelope)
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<ServiceEnvelope<T>, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        let status = response.status();
        debug!(%path, %status, "Backend call");
        let envelope = response
            .json::<ServiceEnvelope<T>>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("{} from {}", e, path)))?;
        Ok(envelope)
    }

    async fn get_json<T>(&self, path: &str) -> Result<ServiceEnvelope<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        debug!(%path, %status, "Backend call");
        let envelope = response
            .json::<ServiceEnvelope<T>>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("{} from {}", e, path)))?;
        Ok(envelope)
    }
}

fn require_data<T>(envelope: ServiceEnvelope<T>, what: &str) -> Result<T, AppError> {
    if !envelope.success {
        return Err(AppError::UpstreamRejected(
            envelope
                .message
                .unwrap_or_else(|| format!("{} request rejected", what)),
        ));
    }
    envelope
        .data
        .ok_or_else(|| AppError::MalformedResponse(format!("{} response without data", what)))
}

#[async_trait]
impl HoldService for BackendClient {
    async fn create_holds(&self, items: &[HoldCreateItem]) -> Result<Vec<TicketHold>, AppError> {
        let envelope = self
            .post_json::<_, Vec<TicketHold>>("/ticket-holds", items)
            .await?;
        require_data(envelope, "hold creation")
    }

    async fn update_hold(&self, hold_id: &str, quantity: u32) -> Result<bool, AppError> {
        let envelope = self
            .put_json::<_, serde_json::Value>(
                &format!("/ticket-holds/{}", hold_id),
                &json!({ "quantity": quantity }),
            )
            .await?;
        Ok(envelope.success)
    }
}

#[async_trait]
impl CouponService for BackendClient {
    async fn check(
        &self,
        code: &str,
        event_id: &str,
    ) -> Result<ServiceEnvelope<CouponCheckData>, AppError> {
        self.post_json(
            "/coupons/check",
            &json!({ "code": code, "eventId": event_id }),
        )
        .await
    }
}

#[async_trait]
impl PurchaseService for BackendClient {
    async fn submit(
        &self,
        request: &PurchaseRequest,
    ) -> Result<ServiceEnvelope<PurchaseOutcome>, AppError> {
        self.post_json("/purchases", request).await
    }
}

#[async_trait]
impl PaymentStatusService for BackendClient {
    async fn verify(&self, payment_id: &str) -> Result<PaymentStatus, AppError> {
        let envelope = self
            .get_json::<PaymentStatus>(&format!("/payments/{}/status", payment_id))
            .await?;
        require_data(envelope, "payment status")
    }
}

#[async_trait]
impl SoldTicketsService for BackendClient {
    async fn sold_tickets(&self, event_id: &str) -> Result<Vec<SoldTicketsEntry>, AppError> {
        let envelope = self
            .get_json::<Vec<SoldTicketsEntry>>(&format!("/events/{}/sold-tickets", event_id))
            .await?;
        require_data(envelope, "sold tickets")
    }
}
