//! Stable identifiers for cart lines and the active-date indirection that maps
//! a recurring event's date set onto its one purchasable occurrence.

use crate::models::cart::TicketTypeSelection;
use crate::models::event::EventSnapshot;

/// Display/legacy identifier for a (selection, day) pair.
///
/// Legacy single-price-per-day lines carry no ticket type and identify by the
/// date alone. Modern lines identify by ticket type, joined with the date when
/// the caller asks for the disambiguated form (needed once the same type spans
/// several days).
pub fn line_identifier(
    selection: &TicketTypeSelection,
    date_id: Option<&str>,
    disambiguate: bool,
) -> String {
    match (&selection.ticket_type_id, date_id) {
        (None, Some(date)) => date.to_string(),
        (Some(ticket_type), Some(date)) if disambiguate => {
            format!("{}_{}", ticket_type, date)
        }
        (Some(ticket_type), _) => ticket_type.clone(),
        (None, None) => String::new(),
    }
}

/// Resolves the date id every downstream lookup must use.
///
/// Non-recurring events keep the originally selected date. Recurring events
/// always resolve to the date flagged active, regardless of which occurrence
/// was in the cart when it was added; if no date is active the original id is
/// kept as a fallback.
pub fn resolve_active_date<'a>(
    event: &'a EventSnapshot,
    original_date_id: Option<&'a str>,
) -> Option<String> {
    if !event.is_recurring() {
        return original_date_id.map(str::to_string);
    }
    match event.active_date() {
        Some(date) => Some(date.id.clone()),
        None => original_date_id.map(str::to_string),
    }
}
