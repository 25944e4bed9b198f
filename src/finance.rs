/// Finance entries
///
/// A submitted income or expense record. The owning username always comes
/// from the validated session, never from the request body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validators::{optional_text, validate_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(EntryKind::Income),
            "expense" => Ok(EntryKind::Expense),
            "" => Err(ValidationError::EmptyField("type".to_string())),
            _ => Err(ValidationError::InvalidFormat("type".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceEntry {
    pub username: String,
    pub kind: EntryKind,
    pub source: Option<String>,
    /// Decimal string, at most two fractional digits
    pub amount: String,
    /// `None` lets the store stamp the insert time
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// JSON body of a finance submission; unknown fields are ignored
#[derive(Debug, Deserialize)]
pub struct FinanceSubmission {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Option<String>,
    pub amount: String,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl FinanceSubmission {
    /// Validate the submission and bind it to `username`.
    pub fn into_entry(self, username: &str) -> Result<FinanceEntry, ValidationError> {
        Ok(FinanceEntry {
            username: username.to_string(),
            kind: EntryKind::parse(&self.kind)?,
            source: optional_text("source", self.source.as_deref())?,
            amount: validate_amount(&self.amount)?,
            date: self.date,
            description: optional_text("description", self.description.as_deref())?,
        })
    }
}
