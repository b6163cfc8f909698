//! Company change events.
//!
//! Wire format (JSON):
//!
//! ```json
//! {"type": "update", "subject": {"name": "...", ...}, "oldName": "...", "oldCode": "..."}
//! ```
//!
//! `subject` is always an object and `oldName`/`oldCode` are always strings;
//! unused parts are left empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Company;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyEventType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for CompanyEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Notification of a completed company mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyEvent {
    #[serde(rename = "type")]
    pub event_type: CompanyEventType,
    pub subject: Company,
    pub old_name: String,
    pub old_code: String,
}

impl CompanyEvent {
    pub fn created(company: &Company) -> Self {
        Self {
            event_type: CompanyEventType::Create,
            subject: company.clone(),
            old_name: String::new(),
            old_code: String::new(),
        }
    }

    pub fn updated(old_name: &str, old_code: &str, company: &Company) -> Self {
        Self {
            event_type: CompanyEventType::Update,
            subject: company.clone(),
            old_name: old_name.to_string(),
            old_code: old_code.to_string(),
        }
    }

    pub fn deleted(name: &str, code: &str) -> Self {
        Self {
            event_type: CompanyEventType::Delete,
            subject: Company::default(),
            old_name: name.to_string(),
            old_code: code.to_string(),
        }
    }
}
