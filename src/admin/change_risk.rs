//! Scores how risky a proposed event edit is for buyers who already hold
//! tickets. A fixed rule table maps each editable field to a severity; the
//! aggregate score is bounded.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::event::EventSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub field: String,
    pub severity: Severity,
}

/// Per-severity point values, per-field severities and the score cap. The
/// values are a product decision, kept as data so they can be re-tuned
/// without touching the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRuleTable {
    pub low_points: u32,
    pub medium_points: u32,
    pub high_points: u32,
    pub critical_points: u32,
    pub score_cap: u32,
    pub field_severities: Vec<(String, Severity)>,
}

impl Default for RiskRuleTable {
    fn default() -> Self {
        Self {
            low_points: 5,
            medium_points: 10,
            high_points: 25,
            critical_points: 50,
            score_cap: 100,
            field_severities: vec![
                ("name".into(), Severity::Medium),
                ("image".into(), Severity::Low),
                ("price".into(), Severity::High),
                ("maxInstallments".into(), Severity::Low),
                ("buyTicketsLimit".into(), Severity::Medium),
                ("isFree".into(), Severity::Critical),
                ("batches".into(), Severity::High),
                ("dates".into(), Severity::Critical),
                ("ticketTypes".into(), Severity::High),
                ("recurrence".into(), Severity::Critical),
                ("form".into(), Severity::Medium),
                ("isFormForEachTicket".into(), Severity::Medium),
            ],
        }
    }
}

impl RiskRuleTable {
    pub fn severity_of(&self, field: &str) -> Option<Severity> {
        self.field_severities
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, severity)| *severity)
    }

    pub fn points_for(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Low => self.low_points,
            Severity::Medium => self.medium_points,
            Severity::High => self.high_points,
            Severity::Critical => self.critical_points,
        }
    }
}

/// Diffs a proposed edit against the original snapshot, one change item per
/// differing field known to the rule table.
pub fn detect_changes(
    original: &EventSnapshot,
    proposed: &EventSnapshot,
    table: &RiskRuleTable,
) -> Vec<ChangeItem> {
    let fields = [
        ("name", json!(original.name) != json!(proposed.name)),
        ("image", json!(original.image) != json!(proposed.image)),
        ("price", original.price != proposed.price),
        (
            "maxInstallments",
            original.max_installments != proposed.max_installments,
        ),
        (
            "buyTicketsLimit",
            original.buy_tickets_limit != proposed.buy_tickets_limit,
        ),
        ("isFree", original.is_free != proposed.is_free),
        ("batches", json!(original.batches) != json!(proposed.batches)),
        ("dates", json!(original.dates) != json!(proposed.dates)),
        (
            "ticketTypes",
            json!(original.ticket_types) != json!(proposed.ticket_types),
        ),
        (
            "recurrence",
            json!(original.recurrence) != json!(proposed.recurrence),
        ),
        ("form", original.form != proposed.form),
        (
            "isFormForEachTicket",
            original.is_form_for_each_ticket != proposed.is_form_for_each_ticket,
        ),
    ];

    fields
        .into_iter()
        .filter(|(_, changed)| *changed)
        .filter_map(|(field, _)| {
            table.severity_of(field).map(|severity| ChangeItem {
                field: field.to_string(),
                severity,
            })
        })
        .collect()
}

/// Sums per-severity points, capped.
pub fn risk_score(changes: &[ChangeItem], table: &RiskRuleTable) -> u32 {
    let total: u32 = changes
        .iter()
        .map(|item| table.points_for(item.severity))
        .sum();
    total.min(table.score_cap)
}
