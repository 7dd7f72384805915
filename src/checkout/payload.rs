//! Reshapes accumulated checkout state into the single nested request the
//! purchase endpoint expects.

use std::collections::HashMap;

use crate::models::cart::CartLine;
use crate::models::event::EventSnapshot;
use crate::models::form::{AnswerKey, AnswerSheet, AnswerValue, FieldKind};
use crate::models::payment::{CardSelection, PaymentMethod};
use crate::models::purchase::{
    AnswerEntry, CardInfo, DateAmount, EventDatesGroup, EventFormAnswers, EventTicketAmount,
    MultiAnswerEntry, OrganizerClient, PurchaseRequest, TicketFormAnswers, TicketTypeAmount,
};
use crate::pricing::identity::resolve_active_date;
use crate::utils::error::AppError;

/// Reseller checkout context: who sells, and on whose behalf. Exactly one of
/// the customer forms is stamped into the request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerContext {
    pub seller_user_id: String,
    pub customer: SellerCustomer,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SellerCustomer {
    Existing { customer_user_id: String },
    New(OrganizerClient),
}

#[derive(Debug, Clone)]
pub struct PayloadInput<'a> {
    pub cart: &'a [CartLine],
    pub events: &'a [EventSnapshot],
    pub answers: &'a AnswerSheet,
    pub coupon_codes: &'a [String],
    pub payment_method: PaymentMethod,
    pub card: Option<&'a CardSelection>,
    pub installments: u32,
    pub is_insured: bool,
    pub hold_ids: Vec<String>,
    pub seller: Option<&'a SellerContext>,
}

pub fn build_purchase_request(input: PayloadInput<'_>) -> Result<PurchaseRequest, AppError> {
    let mut request = PurchaseRequest {
        payment_method: input.payment_method,
        is_insured: input.is_insured,
        coupon_codes: input.coupon_codes.to_vec(),
        remove_ticket_hold_ids: input.hold_ids,
        ..PurchaseRequest::default()
    };

    for line in input.cart {
        let event = find_event(input.events, &line.event_id)?;

        if !line.has_ticket_types() {
            // flat lines land in eventTicketAmount
            push_flat_amount(&mut request.event_ticket_amount, &event.id, line.quantity);
        } else if line.has_dated_selections() {
            // dated selections land in the per-event date grouping
            push_date_amounts(&mut request.event_dates_ids, event, line);
        }

        // ticket-type grouping is built independently of the two above
        for selection in &line.ticket_types {
            if selection.days.is_empty() {
                request.event_ticket_types_ids.push(TicketTypeAmount {
                    ticket_type_id: selection.ticket_type_id.clone(),
                    amount: selection.quantity,
                    event_date_id: None,
                });
            } else {
                for day in &selection.days {
                    request.event_ticket_types_ids.push(TicketTypeAmount {
                        ticket_type_id: selection.ticket_type_id.clone(),
                        amount: selection.quantity,
                        event_date_id: resolve_active_date(event, Some(day)),
                    });
                }
            }
        }
    }

    request.event_forms = reshape_answers(input.cart, input.events, input.answers);
    request.card_info = build_card_info(input.payment_method, input.card, input.installments)?;

    if let Some(seller) = input.seller {
        request.seller_user_id = Some(seller.seller_user_id.clone());
        match &seller.customer {
            SellerCustomer::Existing { customer_user_id } => {
                request.customer_user_id = Some(customer_user_id.clone());
            }
            SellerCustomer::New(client) => {
                request.organizer_client = Some(client.clone());
            }
        }
    }

    Ok(request)
}

fn find_event<'a>(
    events: &'a [EventSnapshot],
    event_id: &str,
) -> Result<&'a EventSnapshot, AppError> {
    events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' not in snapshot set", event_id)))
}

fn push_flat_amount(amounts: &mut Vec<EventTicketAmount>, event_id: &str, quantity: u32) {
    if let Some(existing) = amounts.iter_mut().find(|a| a.event_id == event_id) {
        existing.amount += quantity;
    } else {
        amounts.push(EventTicketAmount {
            event_id: event_id.to_string(),
            amount: quantity,
        });
    }
}

fn push_date_amounts(groups: &mut Vec<EventDatesGroup>, event: &EventSnapshot, line: &CartLine) {
    let group = match groups.iter_mut().find(|g| g.event_id == event.id) {
        Some(g) => g,
        None => {
            groups.push(EventDatesGroup {
                event_id: event.id.clone(),
                dates: Vec::new(),
            });
            groups.last_mut().expect("just pushed")
        }
    };

    for selection in &line.ticket_types {
        for day in &selection.days {
            let Some(resolved) = resolve_active_date(event, Some(day)) else {
                continue;
            };
            // same-date entries merge by summing
            if let Some(existing) = group.dates.iter_mut().find(|d| d.event_date_id == resolved)
            {
                existing.amount += selection.quantity;
            } else {
                group.dates.push(DateAmount {
                    event_date_id: resolved,
                    amount: selection.quantity,
                });
            }
        }
    }
}

/// Replays the cart's ticket-type quantities, in cart order, to map each
/// ticket index of an event to its ticket type.
fn ticket_type_by_index(cart: &[CartLine], event_id: &str) -> Vec<Option<String>> {
    let mut map = Vec::new();
    for line in cart.iter().filter(|l| l.event_id == event_id) {
        if line.ticket_types.is_empty() {
            map.extend(std::iter::repeat(None).take(line.quantity as usize));
        } else {
            for selection in &line.ticket_types {
                map.extend(
                    std::iter::repeat(selection.ticket_type_id.clone())
                        .take(selection.quantity as usize),
                );
            }
        }
    }
    map
}

/// Groups the answer sheet by event, then ticket number, producing one typed
/// record per ticket instance. Entries inside each array are ordered by the
/// field's explicit order. Number and phone answers travel in `text`.
fn reshape_answers(
    cart: &[CartLine],
    events: &[EventSnapshot],
    answers: &AnswerSheet,
) -> Vec<EventFormAnswers> {
    let mut forms = Vec::new();

    for event in events {
        let mut by_ticket: HashMap<u32, Vec<(&AnswerKey, &crate::models::form::FormAnswer)>> =
            HashMap::new();
        for (key, answer) in answers.iter().filter(|(k, _)| k.event_id == event.id) {
            by_ticket.entry(key.ticket_number).or_default().push((key, answer));
        }
        if by_ticket.is_empty() {
            continue;
        }

        let type_map = ticket_type_by_index(cart, &event.id);

        let mut ticket_numbers: Vec<u32> = by_ticket.keys().copied().collect();
        ticket_numbers.sort_unstable();

        let tickets = ticket_numbers
            .into_iter()
            .map(|ticket_number| {
                let mut entries = by_ticket.remove(&ticket_number).unwrap_or_default();
                entries.sort_by_key(|(key, _)| key.order);

                let mut record = TicketFormAnswers {
                    ticket_number,
                    ticket_type_id: type_map
                        .get(ticket_number as usize)
                        .cloned()
                        .flatten(),
                    ..TicketFormAnswers::default()
                };

                for (key, answer) in entries {
                    match key.kind {
                        FieldKind::MultiSelect => record.multi_select.push(MultiAnswerEntry {
                            label: answer.label.clone(),
                            answer: match &answer.answer {
                                AnswerValue::Multi(items) => items.clone(),
                                AnswerValue::Text(s) => vec![s.clone()],
                            },
                        }),
                        kind => {
                            let entry = AnswerEntry {
                                label: answer.label.clone(),
                                answer: match &answer.answer {
                                    AnswerValue::Text(s) => s.clone(),
                                    AnswerValue::Multi(items) => items.join(", "),
                                },
                            };
                            match kind {
                                FieldKind::Email => record.email.push(entry),
                                FieldKind::TextArea => record.text_area.push(entry),
                                FieldKind::Select => record.select.push(entry),
                                // Text, Number and Phone are all plain strings
                                _ => record.text.push(entry),
                            }
                        }
                    }
                }

                record
            })
            .collect();

        forms.push(EventFormAnswers {
            event_id: event.id.clone(),
            tickets,
        });
    }

    forms
}

/// Credit purchases require a card: a saved card sends only its id and the
/// installment count (raw fields stay blank); a new card must be locally
/// complete before anything goes on the wire.
fn build_card_info(
    payment_method: PaymentMethod,
    card: Option<&CardSelection>,
    installments: u32,
) -> Result<Option<CardInfo>, AppError> {
    if payment_method != PaymentMethod::Credit {
        return Ok(None);
    }
    let Some(card) = card else {
        return Err(AppError::ValidationError(
            "Select a payment card to continue".into(),
        ));
    };
    let info = match card {
        CardSelection::Saved { card_id } => CardInfo {
            card_id: Some(card_id.clone()),
            installments,
            ..CardInfo::default()
        },
        CardSelection::New(details) => {
            details.validate_complete()?;
            CardInfo {
                card_id: None,
                holder_name: details.holder_name.clone(),
                number: details.number.clone(),
                expiry_month: details.expiry_month.clone(),
                expiry_year: details.expiry_year.clone(),
                cvv: details.cvv.clone(),
                document: details.document.clone(),
                installments,
            }
        }
    };
    Ok(Some(info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::TicketTypeSelection;
    use crate::models::event::{EventDate, Recurrence};
    use crate::models::form::FormAnswer;
    use crate::models::payment::CardDetails;

    fn event(id: &str, recurring: bool, dates: Vec<(&str, bool)>) -> EventSnapshot {
        EventSnapshot {
            id: id.into(),
            name: "Festival".into(),
            image: None,
            price: 5000,
            max_installments: None,
            buy_tickets_limit: None,
            is_free: false,
            batches: vec![],
            dates: dates
                .into_iter()
                .map(|(date_id, is_active)| EventDate {
                    id: date_id.into(),
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
            is_form_for_each_ticket: true,
        }
    }

    fn flat_line(event_id: &str, quantity: u32) -> CartLine {
        CartLine {
            event_id: event_id.into(),
            batch_id: "b1".into(),
            batch_name: "lot".into(),
            quantity,
            ticket_types: vec![],
            price: 5000,
            is_client_taxed: false,
            is_free: false,
        }
    }

    fn typed_line(event_id: &str, selections: Vec<(&str, u32, Vec<&str>)>) -> CartLine {
        CartLine {
            ticket_types: selections
                .into_iter()
                .map(|(id, quantity, days)| TicketTypeSelection {
                    ticket_type_id: Some(id.into()),
                    ticket_type_name: id.to_uppercase(),
                    quantity,
                    days: days.into_iter().map(str::to_string).collect(),
                })
                .collect(),
            ..flat_line(event_id, 0)
        }
    }

    fn base_input<'a>(
        cart: &'a [CartLine],
        events: &'a [EventSnapshot],
        answers: &'a AnswerSheet,
    ) -> PayloadInput<'a> {
        PayloadInput {
            cart,
            events,
            answers,
            coupon_codes: &[],
            payment_method: PaymentMethod::Pix,
            card: None,
            installments: 1,
            is_insured: false,
            hold_ids: vec![],
            seller: None,
        }
    }

    #[test]
    fn flat_and_dated_groupings_coexist_for_one_event() {
        let events = vec![event("ev", false, vec![("d1", false), ("d2", false)])];
        let cart = vec![
            flat_line("ev", 2),
            typed_line("ev", vec![("vip", 1, vec!["d1", "d2"])]),
        ];
        let answers = AnswerSheet::new();

        let request = build_purchase_request(base_input(&cart, &events, &answers)).unwrap();

        assert_eq!(request.event_ticket_amount.len(), 1);
        assert_eq!(request.event_ticket_amount[0].amount, 2);
        assert_eq!(request.event_dates_ids.len(), 1);
        assert_eq!(request.event_dates_ids[0].dates.len(), 2);
        assert_eq!(request.event_ticket_types_ids.len(), 2);
    }

    #[test]
    fn same_date_entries_merge_by_summing() {
        let events = vec![event("ev", false, vec![("d1", false)])];
        let cart = vec![typed_line(
            "ev",
            vec![("vip", 2, vec!["d1"]), ("half", 3, vec!["d1"])],
        )];
        let answers = AnswerSheet::new();

        let request = build_purchase_request(base_input(&cart, &events, &answers)).unwrap();

        let dates = &request.event_dates_ids[0].dates;
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].event_date_id, "d1");
        assert_eq!(dates[0].amount, 5);
    }

    #[test]
    fn recurring_dates_resolve_to_the_active_occurrence() {
        let events = vec![event("ev", true, vec![("d1", false), ("d2", true)])];
        let cart = vec![typed_line("ev", vec![("vip", 1, vec!["d1"])])];
        let answers = AnswerSheet::new();

        let request = build_purchase_request(base_input(&cart, &events, &answers)).unwrap();

        assert_eq!(request.event_dates_ids[0].dates[0].event_date_id, "d2");
        assert_eq!(
            request.event_ticket_types_ids[0].event_date_id.as_deref(),
            Some("d2")
        );
    }

    #[test]
    fn answers_reshape_per_ticket_with_type_attached() {
        let events = vec![event("ev", false, vec![])];
        let cart = vec![typed_line("ev", vec![("vip", 1, vec![]), ("half", 1, vec![])])];

        let mut answers = AnswerSheet::new();
        let mut put = |ticket_number, kind, order, label: &str, value: AnswerValue| {
            answers.insert(
                AnswerKey {
                    event_id: "ev".into(),
                    ticket_number,
                    kind,
                    order,
                },
                FormAnswer {
                    label: label.into(),
                    answer: value,
                },
            );
        };
        put(0, FieldKind::Text, 1, "Name", AnswerValue::Text("Ana".into()));
        put(0, FieldKind::Number, 2, "Age", AnswerValue::Text("31".into()));
        put(
            0,
            FieldKind::MultiSelect,
            3,
            "Days",
            AnswerValue::Multi(vec!["Sat".into(), "Sun".into()]),
        );
        put(1, FieldKind::Text, 1, "Name", AnswerValue::Text("Bruno".into()));

        let request = build_purchase_request(base_input(&cart, &events, &answers)).unwrap();

        assert_eq!(request.event_forms.len(), 1);
        let tickets = &request.event_forms[0].tickets;
        assert_eq!(tickets.len(), 2);

        let first = &tickets[0];
        assert_eq!(first.ticket_number, 0);
        assert_eq!(first.ticket_type_id.as_deref(), Some("vip"));
        // number answers fold into text, ordered by the field order
        assert_eq!(first.text.len(), 2);
        assert_eq!(first.text[0].label, "Name");
        assert_eq!(first.text[1].label, "Age");
        assert_eq!(first.multi_select.len(), 1);
        assert_eq!(first.multi_select[0].answer, vec!["Sat", "Sun"]);

        let second = &tickets[1];
        assert_eq!(second.ticket_number, 1);
        assert_eq!(second.ticket_type_id.as_deref(), Some("half"));
    }

    #[test]
    fn saved_card_sends_only_id_and_installments() {
        let events = vec![event("ev", false, vec![])];
        let cart = vec![flat_line("ev", 1)];
        let answers = AnswerSheet::new();
        let card = CardSelection::Saved {
            card_id: "card-9".into(),
        };

        let mut input = base_input(&cart, &events, &answers);
        input.payment_method = PaymentMethod::Credit;
        input.card = Some(&card);
        input.installments = 3;

        let request = build_purchase_request(input).unwrap();
        let info = request.card_info.unwrap();
        assert_eq!(info.card_id.as_deref(), Some("card-9"));
        assert_eq!(info.installments, 3);
        assert!(info.number.is_empty());
        assert!(info.cvv.is_empty());
    }

    #[test]
    fn incomplete_new_card_is_rejected_locally() {
        let events = vec![event("ev", false, vec![])];
        let cart = vec![flat_line("ev", 1)];
        let answers = AnswerSheet::new();
        let card = CardSelection::New(CardDetails {
            holder_name: "ANA".into(),
            ..CardDetails::default()
        });

        let mut input = base_input(&cart, &events, &answers);
        input.payment_method = PaymentMethod::Credit;
        input.card = Some(&card);

        assert!(matches!(
            build_purchase_request(input),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn credit_without_card_is_rejected() {
        let events = vec![event("ev", false, vec![])];
        let cart = vec![flat_line("ev", 1)];
        let answers = AnswerSheet::new();

        let mut input = base_input(&cart, &events, &answers);
        input.payment_method = PaymentMethod::Credit;

        assert!(build_purchase_request(input).is_err());
    }

    #[test]
    fn seller_stamps_exactly_one_customer_form() {
        let events = vec![event("ev", false, vec![])];
        let cart = vec![flat_line("ev", 1)];
        let answers = AnswerSheet::new();

        let existing = SellerContext {
            seller_user_id: "seller-1".into(),
            customer: SellerCustomer::Existing {
                customer_user_id: "cust-1".into(),
            },
        };
        let mut input = base_input(&cart, &events, &answers);
        input.seller = Some(&existing);
        let request = build_purchase_request(input).unwrap();
        assert_eq!(request.seller_user_id.as_deref(), Some("seller-1"));
        assert_eq!(request.customer_user_id.as_deref(), Some("cust-1"));
        assert!(request.organizer_client.is_none());

        let fresh = SellerContext {
            seller_user_id: "seller-1".into(),
            customer: SellerCustomer::New(OrganizerClient {
                name: "Carla".into(),
                email: "carla@example.com".into(),
                phone: None,
                document: None,
            }),
        };
        let mut input = base_input(&cart, &events, &answers);
        input.seller = Some(&fresh);
        let request = build_purchase_request(input).unwrap();
        assert!(request.customer_user_id.is_none());
        assert!(request.organizer_client.is_some());
    }

    #[test]
    fn hold_ids_are_always_carried() {
        let events = vec![event("ev", false, vec![])];
        let cart = vec![flat_line("ev", 1)];
        let answers = AnswerSheet::new();

        let mut input = base_input(&cart, &events, &answers);
        input.hold_ids = vec!["h1".into(), "h2".into()];
        let request = build_purchase_request(input).unwrap();
        assert_eq!(request.remove_ticket_hold_ids, vec!["h1", "h2"]);
    }
}
