use serde::{Deserialize, Serialize};

/// A backend-side inventory reservation for one (batch, date, ticket type) tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketHold {
    pub id: String,
    pub event_id: String,
    pub event_batch_id: String,
    pub event_date_id: Option<String>,
    pub ticket_type_id: Option<String>,
    pub quantity: u32,
}

/// Lookup key for holds within one checkout session.
///
/// `None` means the hold is not bound to a date / ticket type, and matches only
/// entries where that field is also absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HoldKey {
    pub event_date_id: Option<String>,
    pub ticket_type_id: Option<String>,
}

impl HoldKey {
    pub fn new(event_date_id: Option<&str>, ticket_type_id: Option<&str>) -> Self {
        Self {
            event_date_id: event_date_id.map(str::to_string),
            ticket_type_id: ticket_type_id.map(str::to_string),
        }
    }
}

/// One row of the sold-tickets snapshot for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldTicketsEntry {
    pub event_batch_id: String,
    pub event_date_id: Option<String>,
    pub ticket_type_id: Option<String>,
    pub sold: u32,
}

/// Pure read over a fetched sold-tickets snapshot.
///
/// `None` for date or ticket type matches only entries where that field is
/// null, never "any".
pub fn sold_quantity(
    snapshot: &[SoldTicketsEntry],
    batch_id: &str,
    date_id: Option<&str>,
    ticket_type_id: Option<&str>,
) -> u32 {
    snapshot
        .iter()
        .filter(|e| {
            e.event_batch_id == batch_id
                && e.event_date_id.as_deref() == date_id
                && e.ticket_type_id.as_deref() == ticket_type_id
        })
        .map(|e| e.sold)
        .sum()
}
