//! Wire DTOs for the purchase endpoint. Field names follow the backend's JSON
//! shape; construction logic lives in `checkout::payload`.

use serde::{Deserialize, Serialize};

use crate::models::payment::PaymentMethod;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Flat per-event quantities from lines without ticket types.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub event_ticket_amount: Vec<EventTicketAmount>,
    /// Per-event date quantities from lines whose selections bind to days.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub event_dates_ids: Vec<EventDatesGroup>,
    /// Per-selection ticket-type quantities.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub event_ticket_types_ids: Vec<TicketTypeAmount>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub event_forms: Vec<EventFormAnswers>,
    #[serde(default)]
    pub remove_ticket_hold_ids: Vec<String>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_info: Option<CardInfo>,
    pub is_insured: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub coupon_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_client: Option<OrganizerClient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTicketAmount {
    pub event_id: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDatesGroup {
    pub event_id: String,
    pub dates: Vec<DateAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAmount {
    pub event_date_id: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTypeAmount {
    pub ticket_type_id: Option<String>,
    pub amount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date_id: Option<String>,
}

/// Card data as the purchase endpoint expects it. When a saved card pays, the
/// raw fields stay blank and only `card_id` + `installments` matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    pub holder_name: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub document: String,
    pub installments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFormAnswers {
    pub event_id: String,
    pub tickets: Vec<TicketFormAnswers>,
}

/// Answers for one ticket instance, grouped into the typed arrays the backend
/// stores. Number and phone answers travel in `text`, since they are plain
/// strings on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFormAnswers {
    pub ticket_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_type_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub text: Vec<AnswerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub email: Vec<AnswerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default, rename = "textArea")]
    pub text_area: Vec<AnswerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub select: Vec<AnswerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default, rename = "multiSelect")]
    pub multi_select: Vec<MultiAnswerEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub label: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAnswerEntry {
    pub label: String,
    pub answer: Vec<String>,
}

/// A new organizer-managed client inlined in a seller checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerClient {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}
