//! Temporary inventory holds for one checkout session: created once at entry,
//! kept in sync as quantities change, surrendered at purchase finalize.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::cart::CartLine;
use crate::models::event::EventSnapshot;
use crate::models::hold::{HoldKey, TicketHold};
use crate::pricing::identity::resolve_active_date;
use crate::services::{HoldCreateItem, HoldService};
use crate::utils::error::AppError;

/// Tracks this session's holds against the backend hold service.
pub struct HoldCoordinator {
    service: Arc<dyn HoldService>,
    holds: HashMap<HoldKey, TicketHold>,
    /// One-shot guard: creation runs at most once per session.
    ensured: bool,
}

impl HoldCoordinator {
    pub fn new(service: Arc<dyn HoldService>) -> Self {
        Self {
            service,
            holds: HashMap::new(),
            ensured: false,
        }
    }

    /// All currently tracked hold ids, for `removeTicketHoldIds` at finalize.
    pub fn hold_ids(&self) -> Vec<String> {
        self.holds.values().map(|h| h.id.clone()).collect()
    }

    pub fn tracked_count(&self) -> usize {
        self.holds.len()
    }

    /// Requests one hold per distinct (batch, resolved date, ticket type)
    /// tuple implied by the cart, expanding multi-day aggregates into one
    /// tuple per represented day. Idempotent: after the first successful
    /// creation, re-invocation returns the existing ids without calling the
    /// backend. Unauthenticated sessions hold nothing.
    pub async fn ensure_holds(
        &mut self,
        cart: &[CartLine],
        event: &EventSnapshot,
        authenticated: bool,
    ) -> Result<Vec<String>, AppError> {
        if !authenticated || self.ensured {
            return Ok(self.hold_ids());
        }

        let items = expand_hold_tuples(cart, event);
        if items.is_empty() {
            self.ensured = true;
            return Ok(Vec::new());
        }

        let created = self.service.create_holds(&items).await?;
        self.ensured = true;

        for hold in created {
            let key = HoldKey::new(hold.event_date_id.as_deref(), hold.ticket_type_id.as_deref());
            self.holds.insert(key, hold);
        }
        debug!(holds = self.holds.len(), "Ticket holds created");

        Ok(self.hold_ids())
    }

    /// Updates a hold's quantity on the backend first; the local map changes
    /// only after the backend accepts. Returns false on any failure, in which
    /// case the caller must not mutate its own cart state either.
    pub async fn update_hold_quantity(&mut self, hold_id: &str, quantity: u32) -> bool {
        match self.service.update_hold(hold_id, quantity).await {
            Ok(true) => {
                if let Some(hold) = self.holds.values_mut().find(|h| h.id == hold_id) {
                    hold.quantity = quantity;
                }
                true
            }
            Ok(false) => {
                warn!(hold_id, quantity, "Hold update refused by backend");
                false
            }
            Err(e) => {
                warn!(hold_id, quantity, error = %e, "Hold update failed");
                false
            }
        }
    }

    /// Finds the hold for a (date, ticket type) pair: exact match first, then
    /// any hold on the same date. Empty string means "no hold to update" and
    /// is not an error.
    pub fn find_hold_id(&self, date_id: Option<&str>, ticket_type_id: Option<&str>) -> String {
        let exact = HoldKey::new(date_id, ticket_type_id);
        if let Some(hold) = self.holds.get(&exact) {
            return hold.id.clone();
        }
        if date_id.is_some() {
            if let Some(hold) = self
                .holds
                .values()
                .find(|h| h.event_date_id.as_deref() == date_id)
            {
                return hold.id.clone();
            }
        }
        String::new()
    }
}

/// Expands the cart into the distinct hold tuples it implies, routing every
/// date through the active-date resolution and merging duplicates.
fn expand_hold_tuples(cart: &[CartLine], event: &EventSnapshot) -> Vec<HoldCreateItem> {
    let mut quantities: HashMap<(String, Option<String>, Option<String>), u32> = HashMap::new();

    for line in cart {
        if line.event_id != event.id {
            continue;
        }
        if line.ticket_types.is_empty() {
            *quantities
                .entry((line.batch_id.clone(), None, None))
                .or_default() += line.quantity;
            continue;
        }
        for selection in &line.ticket_types {
            if selection.days.is_empty() {
                *quantities
                    .entry((
                        line.batch_id.clone(),
                        None,
                        selection.ticket_type_id.clone(),
                    ))
                    .or_default() += selection.quantity;
            } else {
                for day in &selection.days {
                    let resolved = resolve_active_date(event, Some(day));
                    *quantities
                        .entry((
                            line.batch_id.clone(),
                            resolved,
                            selection.ticket_type_id.clone(),
                        ))
                        .or_default() += selection.quantity;
                }
            }
        }
    }

    quantities
        .into_iter()
        .map(|((batch_id, date_id, ticket_type_id), quantity)| HoldCreateItem {
            event_id: event.id.clone(),
            event_batch_id: batch_id,
            event_date_id: date_id,
            ticket_type_id,
            quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::TicketTypeSelection;
    use crate::models::event::{EventDate, Recurrence};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeHoldService {
        create_calls: AtomicUsize,
        update_result: Mutex<Result<bool, ()>>,
        updates: Mutex<Vec<(String, u32)>>,
    }

    impl FakeHoldService {
        fn new() -> Self {
            Self {
                create_calls: AtomicUsize::new(0),
                update_result: Mutex::new(Ok(true)),
                updates: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HoldService for FakeHoldService {
        async fn create_holds(
            &self,
            items: &[HoldCreateItem],
        ) -> Result<Vec<TicketHold>, AppError> {
            let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(items
                .iter()
                .enumerate()
                .map(|(i, item)| TicketHold {
                    id: format!("hold-{}-{}", n, i),
                    event_id: item.event_id.clone(),
                    event_batch_id: item.event_batch_id.clone(),
                    event_date_id: item.event_date_id.clone(),
                    ticket_type_id: item.ticket_type_id.clone(),
                    quantity: item.quantity,
                })
                .collect())
        }

        async fn update_hold(&self, hold_id: &str, quantity: u32) -> Result<bool, AppError> {
            self.updates
                .lock()
                .unwrap()
                .push((hold_id.to_string(), quantity));
            match *self.update_result.lock().unwrap() {
                Ok(v) => Ok(v),
                Err(()) => Err(AppError::InternalServerError("boom".into())),
            }
        }
    }

    fn event_with_dates(recurring: bool, dates: Vec<(&str, bool)>) -> EventSnapshot {
        EventSnapshot {
            id: "ev".into(),
            name: "Show".into(),
            image: None,
            price: 5000,
            max_installments: None,
            buy_tickets_limit: None,
            is_free: false,
            batches: vec![],
            dates: dates
                .into_iter()
                .map(|(id, is_active)| EventDate {
                    id: id.into(),
                    date: None,
                    is_active,
                })
                .collect(),
            ticket_types: vec![],
            recurrence: recurring.then(|| Recurrence {
                id: "r".into(),
                frequency: "weekly".into(),
            }),
            form: None,
            is_form_for_each_ticket: false,
        }
    }

    fn typed_line(ticket_type_id: &str, quantity: u32, days: &[&str]) -> CartLine {
        CartLine {
            event_id: "ev".into(),
            batch_id: "b1".into(),
            batch_name: "lot".into(),
            quantity: 0,
            ticket_types: vec![TicketTypeSelection {
                ticket_type_id: Some(ticket_type_id.into()),
                ticket_type_name: ticket_type_id.to_uppercase(),
                quantity,
                days: days.iter().map(|d| d.to_string()).collect(),
            }],
            price: 5000,
            is_client_taxed: false,
            is_free: false,
        }
    }

    #[tokio::test]
    async fn ensure_holds_is_idempotent_per_session() {
        let service = Arc::new(FakeHoldService::new());
        let mut coordinator = HoldCoordinator::new(service.clone());
        let event = event_with_dates(false, vec![("d1", false)]);
        let cart = vec![typed_line("vip", 2, &["d1"])];

        let first = coordinator.ensure_holds(&cart, &event, true).await.unwrap();
        let second = coordinator.ensure_holds(&cart, &event, true).await.unwrap();

        assert_eq!(service.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unauthenticated_sessions_hold_nothing() {
        let service = Arc::new(FakeHoldService::new());
        let mut coordinator = HoldCoordinator::new(service.clone());
        let event = event_with_dates(false, vec![]);
        let cart = vec![typed_line("vip", 2, &[])];

        let ids = coordinator.ensure_holds(&cart, &event, false).await.unwrap();
        assert!(ids.is_empty());
        assert_eq!(service.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn multi_day_aggregates_expand_one_tuple_per_day() {
        let service = Arc::new(FakeHoldService::new());
        let mut coordinator = HoldCoordinator::new(service);
        let event = event_with_dates(false, vec![("d1", false), ("d2", false)]);
        let cart = vec![typed_line("vip", 2, &["d1", "d2"])];

        let ids = coordinator.ensure_holds(&cart, &event, true).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(coordinator.find_hold_id(Some("d1"), Some("vip")), "");
        assert_ne!(coordinator.find_hold_id(Some("d2"), Some("vip")), "");
    }

    #[tokio::test]
    async fn recurring_event_tuples_use_the_active_date() {
        let service = Arc::new(FakeHoldService::new());
        let mut coordinator = HoldCoordinator::new(service);
        let event = event_with_dates(true, vec![("d1", false), ("d2", true)]);
        // cart still references the originally selected d1
        let cart = vec![typed_line("vip", 1, &["d1"])];

        coordinator.ensure_holds(&cart, &event, true).await.unwrap();
        assert_ne!(coordinator.find_hold_id(Some("d2"), Some("vip")), "");
        assert_eq!(coordinator.find_hold_id(Some("d1"), Some("vip")), "");
    }

    #[tokio::test]
    async fn failed_update_leaves_local_state_untouched() {
        let service = Arc::new(FakeHoldService::new());
        let mut coordinator = HoldCoordinator::new(service.clone());
        let event = event_with_dates(false, vec![("d1", false)]);
        let cart = vec![typed_line("vip", 2, &["d1"])];
        coordinator.ensure_holds(&cart, &event, true).await.unwrap();

        let hold_id = coordinator.find_hold_id(Some("d1"), Some("vip"));

        *service.update_result.lock().unwrap() = Ok(false);
        assert!(!coordinator.update_hold_quantity(&hold_id, 5).await);
        assert_eq!(
            coordinator.holds.values().next().unwrap().quantity,
            2,
            "refused update must not change the local hold"
        );

        *service.update_result.lock().unwrap() = Err(());
        assert!(!coordinator.update_hold_quantity(&hold_id, 5).await);
        assert_eq!(coordinator.holds.values().next().unwrap().quantity, 2);

        *service.update_result.lock().unwrap() = Ok(true);
        assert!(coordinator.update_hold_quantity(&hold_id, 5).await);
        assert_eq!(coordinator.holds.values().next().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn find_hold_id_falls_back_to_date_only_match() {
        let service = Arc::new(FakeHoldService::new());
        let mut coordinator = HoldCoordinator::new(service);
        let event = event_with_dates(false, vec![("d1", false)]);
        let cart = vec![typed_line("vip", 1, &["d1"])];
        coordinator.ensure_holds(&cart, &event, true).await.unwrap();

        let exact = coordinator.find_hold_id(Some("d1"), Some("vip"));
        let fallback = coordinator.find_hold_id(Some("d1"), Some("other-type"));
        assert_eq!(exact, fallback);
        assert_eq!(coordinator.find_hold_id(Some("d9"), None), "");
    }
}
