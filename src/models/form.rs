use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Field kinds of the custom checkout form, in the order the external JSON
/// format enumerates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Number,
    Email,
    Phone,
    TextArea,
    Select,
    MultiSelect,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Text,
        FieldKind::Number,
        FieldKind::Email,
        FieldKind::Phone,
        FieldKind::TextArea,
        FieldKind::Select,
        FieldKind::MultiSelect,
    ];

    /// Key used for this kind in the external JSON schema and in the purchase
    /// payload's per-ticket answer record.
    pub fn json_key(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::TextArea => "textArea",
            FieldKind::Select => "select",
            FieldKind::MultiSelect => "multiSelect",
        }
    }
}

/// Shared attributes of a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    pub required: bool,
    /// Display position. Ordering is always re-derived from this value, never
    /// from array position.
    pub order: u32,
    pub placeholder: Option<String>,
    pub mask: Option<String>,
}

/// A select-style field carries its choices alongside the shared attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectSpec {
    pub label: String,
    pub required: bool,
    pub order: u32,
    pub placeholder: Option<String>,
    pub options: Vec<String>,
}

/// One custom form field, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text(FieldSpec),
    Number(FieldSpec),
    Email(FieldSpec),
    Phone(FieldSpec),
    TextArea(FieldSpec),
    Select(SelectSpec),
    MultiSelect(SelectSpec),
}

impl FormField {
    pub fn kind(&self) -> FieldKind {
        match self {
            FormField::Text(_) => FieldKind::Text,
            FormField::Number(_) => FieldKind::Number,
            FormField::Email(_) => FieldKind::Email,
            FormField::Phone(_) => FieldKind::Phone,
            FormField::TextArea(_) => FieldKind::TextArea,
            FormField::Select(_) => FieldKind::Select,
            FormField::MultiSelect(_) => FieldKind::MultiSelect,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FormField::Text(s)
            | FormField::Number(s)
            | FormField::Email(s)
            | FormField::Phone(s)
            | FormField::TextArea(s) => &s.label,
            FormField::Select(s) | FormField::MultiSelect(s) => &s.label,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            FormField::Text(s)
            | FormField::Number(s)
            | FormField::Email(s)
            | FormField::Phone(s)
            | FormField::TextArea(s) => s.required,
            FormField::Select(s) | FormField::MultiSelect(s) => s.required,
        }
    }

    pub fn order(&self) -> u32 {
        match self {
            FormField::Text(s)
            | FormField::Number(s)
            | FormField::Email(s)
            | FormField::Phone(s)
            | FormField::TextArea(s) => s.order,
            FormField::Select(s) | FormField::MultiSelect(s) => s.order,
        }
    }
}

/// A parsed custom form. Fields are kept sorted by their explicit `order`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSchema {
    fields: Vec<FormField>,
}

impl FormSchema {
    pub fn new(mut fields: Vec<FormField>) -> Self {
        fields.sort_by_key(FormField::order);
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|f| f.required())
    }
}

/// Wire shape of one field entry in the admin-produced JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldEntry {
    label: String,
    required: bool,
    order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
}

/// Wire shape of the whole schema: one array per field kind. Key names are the
/// external format and must not change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SchemaDoc {
    #[serde(default)]
    text: Vec<FieldEntry>,
    #[serde(default)]
    number: Vec<FieldEntry>,
    #[serde(default)]
    email: Vec<FieldEntry>,
    #[serde(default)]
    phone: Vec<FieldEntry>,
    #[serde(default, rename = "textArea")]
    text_area: Vec<FieldEntry>,
    #[serde(default)]
    select: Vec<FieldEntry>,
    #[serde(default, rename = "multiSelect")]
    multi_select: Vec<FieldEntry>,
}

fn plain_field(entry: &FieldEntry) -> FieldSpec {
    FieldSpec {
        label: entry.label.clone(),
        required: entry.required,
        order: entry.order,
        placeholder: entry.placeholder.clone(),
        mask: entry.mask.clone(),
    }
}

fn select_field(entry: &FieldEntry) -> SelectSpec {
    SelectSpec {
        label: entry.label.clone(),
        required: entry.required,
        order: entry.order,
        placeholder: entry.placeholder.clone(),
        options: entry.options.clone().unwrap_or_default(),
    }
}

/// Parses the admin-side JSON schema into typed fields, re-deriving order from
/// the numeric `order` attribute.
pub fn parse_form_schema(raw: &str) -> Result<FormSchema, AppError> {
    if raw.trim().is_empty() {
        return Ok(FormSchema::default());
    }
    let doc: SchemaDoc = serde_json::from_str(raw)
        .map_err(|e| AppError::ValidationError(format!("Invalid form schema: {}", e)))?;

    let mut fields = Vec::new();
    fields.extend(doc.text.iter().map(|e| FormField::Text(plain_field(e))));
    fields.extend(doc.number.iter().map(|e| FormField::Number(plain_field(e))));
    fields.extend(doc.email.iter().map(|e| FormField::Email(plain_field(e))));
    fields.extend(doc.phone.iter().map(|e| FormField::Phone(plain_field(e))));
    fields.extend(
        doc.text_area
            .iter()
            .map(|e| FormField::TextArea(plain_field(e))),
    );
    fields.extend(doc.select.iter().map(|e| FormField::Select(select_field(e))));
    fields.extend(
        doc.multi_select
            .iter()
            .map(|e| FormField::MultiSelect(select_field(e))),
    );

    Ok(FormSchema::new(fields))
}

/// Serializes a schema back to the external JSON shape.
pub fn schema_to_json(schema: &FormSchema) -> String {
    let mut doc = SchemaDoc::default();
    for field in schema.fields() {
        let entry = match field {
            FormField::Text(s)
            | FormField::Number(s)
            | FormField::Email(s)
            | FormField::Phone(s)
            | FormField::TextArea(s) => FieldEntry {
                label: s.label.clone(),
                required: s.required,
                order: s.order,
                placeholder: s.placeholder.clone(),
                mask: s.mask.clone(),
                options: None,
            },
            FormField::Select(s) | FormField::MultiSelect(s) => FieldEntry {
                label: s.label.clone(),
                required: s.required,
                order: s.order,
                placeholder: s.placeholder.clone(),
                mask: None,
                options: Some(s.options.clone()),
            },
        };
        match field.kind() {
            FieldKind::Text => doc.text.push(entry),
            FieldKind::Number => doc.number.push(entry),
            FieldKind::Email => doc.email.push(entry),
            FieldKind::Phone => doc.phone.push(entry),
            FieldKind::TextArea => doc.text_area.push(entry),
            FieldKind::Select => doc.select.push(entry),
            FieldKind::MultiSelect => doc.multi_select.push(entry),
        }
    }
    serde_json::to_string(&doc).unwrap_or_else(|_| "{}".to_string())
}

/// Identifies one stored answer: which event, which ticket instance, which
/// field. Ticket number is 0 when the form is asked once per order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnswerKey {
    pub event_id: String,
    pub ticket_number: u32,
    pub kind: FieldKind,
    pub order: u32,
}

/// Answer payloads are typed per field kind: multi-selects carry a list,
/// everything else a single string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Multi(Vec<String>),
}

impl AnswerValue {
    pub fn is_answered(&self) -> bool {
        match self {
            AnswerValue::Text(s) => !s.trim().is_empty(),
            AnswerValue::Multi(items) => !items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAnswer {
    pub label: String,
    pub answer: AnswerValue,
}

/// All answers collected during checkout, keyed by typed answer keys.
pub type AnswerSheet = HashMap<AnswerKey, FormAnswer>;

/// True when every required field has a non-empty answer for every required
/// ticket instance. `ticket_count` is ignored for once-per-order forms.
pub fn required_answers_complete(
    schema: &FormSchema,
    answers: &AnswerSheet,
    event_id: &str,
    ticket_count: u32,
    per_ticket: bool,
) -> bool {
    let instances: Vec<u32> = if per_ticket {
        (0..ticket_count).collect()
    } else {
        vec![0]
    };

    schema.required_fields().all(|field| {
        instances.iter().all(|&ticket_number| {
            let key = AnswerKey {
                event_id: event_id.to_string(),
                ticket_number,
                kind: field.kind(),
                order: field.order(),
            };
            answers.get(&key).is_some_and(|a| a.answer.is_answered())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> FormSchema {
        FormSchema::new(vec![
            FormField::Select(SelectSpec {
                label: "Shirt size".into(),
                required: true,
                order: 2,
                placeholder: None,
                options: vec!["P".into(), "M".into(), "G".into()],
            }),
            FormField::Text(FieldSpec {
                label: "Full name".into(),
                required: true,
                order: 1,
                placeholder: Some("As in your ID".into()),
                mask: None,
            }),
            FormField::MultiSelect(SelectSpec {
                label: "Dietary restrictions".into(),
                required: false,
                order: 3,
                placeholder: None,
                options: vec!["Vegetarian".into(), "Vegan".into()],
            }),
        ])
    }

    #[test]
    fn fields_are_sorted_by_order_not_position() {
        let schema = sample_schema();
        let labels: Vec<&str> = schema.fields().iter().map(FormField::label).collect();
        assert_eq!(labels, ["Full name", "Shirt size", "Dietary restrictions"]);
    }

    #[test]
    fn round_trip_preserves_kind_label_required_and_order() {
        let schema = sample_schema();
        let json = schema_to_json(&schema);
        let reparsed = parse_form_schema(&json).unwrap();

        assert_eq!(reparsed.fields().len(), schema.fields().len());
        for (a, b) in schema.fields().iter().zip(reparsed.fields()) {
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.label(), b.label());
            assert_eq!(a.required(), b.required());
            assert_eq!(a.order(), b.order());
        }
    }

    #[test]
    fn parse_reorders_entries_listed_out_of_order() {
        // array position says "Second" first; order fields say otherwise
        let raw = r#"{"text":[{"label":"Second","required":false,"order":5},{"label":"First","required":true,"order":1}]}"#;
        let schema = parse_form_schema(raw).unwrap();
        let labels: Vec<&str> = schema.fields().iter().map(FormField::label).collect();
        assert_eq!(labels, ["First", "Second"]);
    }

    #[test]
    fn empty_and_blank_input_parse_to_empty_schema() {
        assert!(parse_form_schema("").unwrap().is_empty());
        assert!(parse_form_schema("  ").unwrap().is_empty());
        assert!(parse_form_schema("{}").unwrap().is_empty());
    }

    #[test]
    fn external_keys_are_bit_exact() {
        let schema = FormSchema::new(vec![
            FormField::TextArea(FieldSpec {
                label: "Notes".into(),
                required: false,
                order: 1,
                placeholder: None,
                mask: None,
            }),
            FormField::MultiSelect(SelectSpec {
                label: "Days attending".into(),
                required: true,
                order: 2,
                placeholder: None,
                options: vec!["Sat".into(), "Sun".into()],
            }),
        ]);
        let json = schema_to_json(&schema);
        assert!(json.contains("\"textArea\""));
        assert!(json.contains("\"multiSelect\""));
    }

    #[test]
    fn required_completeness_per_ticket() {
        let schema = FormSchema::new(vec![FormField::Text(FieldSpec {
            label: "Full name".into(),
            required: true,
            order: 1,
            placeholder: None,
            mask: None,
        })]);

        let mut answers = AnswerSheet::new();
        let key = |ticket_number| AnswerKey {
            event_id: "ev".into(),
            ticket_number,
            kind: FieldKind::Text,
            order: 1,
        };
        answers.insert(
            key(0),
            FormAnswer {
                label: "Full name".into(),
                answer: AnswerValue::Text("Ana".into()),
            },
        );

        // one of two tickets answered
        assert!(!required_answers_complete(&schema, &answers, "ev", 2, true));

        answers.insert(
            key(1),
            FormAnswer {
                label: "Full name".into(),
                answer: AnswerValue::Text("Bruno".into()),
            },
        );
        assert!(required_answers_complete(&schema, &answers, "ev", 2, true));

        // blank answers do not count
        answers.insert(
            key(1),
            FormAnswer {
                label: "Full name".into(),
                answer: AnswerValue::Text("   ".into()),
            },
        );
        assert!(!required_answers_complete(&schema, &answers, "ev", 2, true));
    }

    #[test]
    fn once_per_order_ignores_ticket_count() {
        let schema = FormSchema::new(vec![FormField::Text(FieldSpec {
            label: "Company".into(),
            required: true,
            order: 1,
            placeholder: None,
            mask: None,
        })]);

        let mut answers = AnswerSheet::new();
        answers.insert(
            AnswerKey {
                event_id: "ev".into(),
                ticket_number: 0,
                kind: FieldKind::Text,
                order: 1,
            },
            FormAnswer {
                label: "Company".into(),
                answer: AnswerValue::Text("ACME".into()),
            },
        );

        assert!(required_answers_complete(&schema, &answers, "ev", 5, false));
    }
}
