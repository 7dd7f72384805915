use serde::{Deserialize, Serialize};

/// One cart line per (event, batch) the buyer selected.
///
/// When `ticket_types` is non-empty the line's quantity is derived from the
/// selections and the flat `quantity` field must not be used for pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub event_id: String,
    pub batch_id: String,
    pub batch_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub ticket_types: Vec<TicketTypeSelection>,
    /// Base unit price in cents, pre-fee.
    pub price: i64,
    pub is_client_taxed: bool,
    pub is_free: bool,
}

impl CartLine {
    /// Quantity that counts for pricing and holds: the sum over ticket-type
    /// selections when any exist, the flat quantity otherwise.
    pub fn effective_quantity(&self) -> u32 {
        if self.ticket_types.is_empty() {
            self.quantity
        } else {
            self.ticket_types.iter().map(|s| s.quantity).sum()
        }
    }

    pub fn has_ticket_types(&self) -> bool {
        !self.ticket_types.is_empty()
    }

    /// True when any selection binds to event dates.
    pub fn has_dated_selections(&self) -> bool {
        self.ticket_types.iter().any(|s| !s.days.is_empty())
    }
}

/// A (ticket type, days) choice inside a cart line.
///
/// `days` semantics: empty = no date binding; one entry = single-day type;
/// more than one = an aggregate still to be split per represented day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTypeSelection {
    pub ticket_type_id: Option<String>,
    pub ticket_type_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub days: Vec<String>,
}

impl TicketTypeSelection {
    pub fn is_multi_day_aggregate(&self) -> bool {
        self.days.len() > 1
    }
}
