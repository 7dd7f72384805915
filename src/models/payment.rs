use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Pix,
    Credit,
    Link,
}

/// Raw card data entered at checkout. Only ever sent when no saved card is
/// selected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub holder_name: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub document: String,
}

impl CardDetails {
    /// Local validation before any network call: every raw field must be
    /// non-empty.
    pub fn validate_complete(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("holderName", &self.holder_name),
            ("number", &self.number),
            ("expiryMonth", &self.expiry_month),
            ("expiryYear", &self.expiry_year),
            ("cvv", &self.cvv),
            ("document", &self.document),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(format!(
                "Missing card fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Which card pays a credit purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardSelection {
    Saved { card_id: String },
    New(CardDetails),
}
