use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only event data fetched at checkout entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    /// Legacy flat price in cents; only a fallback when batches carry no price.
    pub price: i64,
    pub max_installments: Option<u32>,
    pub buy_tickets_limit: Option<u32>,
    pub is_free: bool,
    #[serde(default)]
    pub batches: Vec<EventBatch>,
    #[serde(default)]
    pub dates: Vec<EventDate>,
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
    pub recurrence: Option<Recurrence>,
    /// Custom form schema as the admin side stored it (JSON string).
    pub form: Option<String>,
    #[serde(default)]
    pub is_form_for_each_ticket: bool,
}

impl EventSnapshot {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn batch(&self, batch_id: &str) -> Option<&EventBatch> {
        self.batches.iter().find(|b| b.id == batch_id)
    }

    /// The single active occurrence of a recurring event, if any.
    pub fn active_date(&self) -> Option<&EventDate> {
        self.dates.iter().find(|d| d.is_active)
    }

    pub fn has_form(&self) -> bool {
        self.form.as_ref().is_some_and(|f| !f.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    pub id: String,
    pub name: String,
    /// Flat batch price in cents; None when ticket-type pricing is used.
    pub price: Option<i64>,
    /// Capacity of the batch.
    pub tickets: u32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_activate_next: bool,
    #[serde(default)]
    pub accumulate_unsold: bool,
    pub is_active: bool,
    pub is_finished: bool,
    #[serde(default)]
    pub ticket_types: Vec<EventBatchTicketType>,
}

impl EventBatch {
    /// Per-batch price override for a ticket type, in cents.
    pub fn ticket_type_price(&self, ticket_type_id: &str) -> Option<i64> {
        self.ticket_types
            .iter()
            .find(|t| t.ticket_type_id == ticket_type_id)
            .map(|t| t.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBatchTicketType {
    pub id: String,
    pub ticket_type_id: String,
    pub price: i64,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDate {
    pub id: String,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub id: String,
    pub frequency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_date_lookup() {
        let event = EventSnapshot {
            id: "ev".into(),
            name: "Show".into(),
            image: None,
            price: 0,
            max_installments: None,
            buy_tickets_limit: None,
            is_free: false,
            batches: vec![],
            dates: vec![
                EventDate {
                    id: "d1".into(),
                    date: None,
                    is_active: false,
                },
                EventDate {
                    id: "d2".into(),
                    date: None,
                    is_active: true,
                },
            ],
            ticket_types: vec![],
            recurrence: None,
            form: None,
            is_form_for_each_ticket: false,
        };
        assert_eq!(event.active_date().map(|d| d.id.as_str()), Some("d2"));
    }
}
