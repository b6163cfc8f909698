//! Company record and list filter types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A persisted company. Identity is the `(name, code)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub name: String,
    pub code: String,
    pub country: String,
    pub website: String,
    pub phone: String,
}

impl Company {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = website.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    /// True when this record carries the given identity.
    pub fn is(&self, name: &str, code: &str) -> bool {
        self.name == name && self.code == code
    }

    /// Value of a filterable attribute.
    pub fn field(&self, field: CompanyField) -> &str {
        match field {
            CompanyField::Name => &self.name,
            CompanyField::Code => &self.code,
            CompanyField::Country => &self.country,
            CompanyField::Website => &self.website,
            CompanyField::Phone => &self.phone,
        }
    }
}

/// Attributes a company list can be filtered on.
///
/// Each variant maps to exactly one column of the `companies` table, so filter
/// keys never reach SQL as caller-supplied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompanyField {
    Name,
    Code,
    Country,
    Website,
    Phone,
}

impl CompanyField {
    pub const ALL: [CompanyField; 5] = [
        CompanyField::Name,
        CompanyField::Code,
        CompanyField::Country,
        CompanyField::Website,
        CompanyField::Phone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Code => "code",
            Self::Country => "country",
            Self::Website => "website",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for CompanyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown company field '{s}'"))
    }
}

/// Substring filters plus an optional row cap for listing companies.
///
/// Every present attribute must match (AND). Patterns are case-insensitive
/// substrings; an empty pattern matches any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub params: BTreeMap<CompanyField, String>,
    pub limit: Option<u32>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, field: CompanyField, pattern: impl Into<String>) -> Self {
        self.params.insert(field, pattern.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.limit.is_none()
    }

    /// Whether `company` satisfies every attribute constraint. The limit is not
    /// considered here.
    pub fn matches(&self, company: &Company) -> bool {
        self.params.iter().all(|(field, pattern)| {
            company
                .field(*field)
                .to_lowercase()
                .contains(&pattern.to_lowercase())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_json_uses_plain_field_names() {
        let company = Company::new("Acme", "AC-1").with_country("UA");
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Acme",
                "code": "AC-1",
                "country": "UA",
                "website": "",
                "phone": "",
            })
        );
    }

    #[test]
    fn test_company_missing_fields_default_to_empty() {
        let company: Company = serde_json::from_str(r#"{"name":"test","code":"testCode"}"#).unwrap();
        assert_eq!(company, Company::new("test", "testCode"));
    }

    #[test]
    fn test_field_round_trips_through_str() {
        for field in CompanyField::ALL {
            assert_eq!(field.as_str().parse::<CompanyField>().unwrap(), field);
        }
        assert!("email".parse::<CompanyField>().is_err());
    }

    #[test]
    fn test_filter_matches_all_params_case_insensitively() {
        let company = Company::new("Acme Corp", "AC-1")
            .with_country("UA")
            .with_website("acme.example");

        let filter = FilterOptions::new()
            .with_param(CompanyField::Name, "acme")
            .with_param(CompanyField::Country, "ua");
        assert!(filter.matches(&company));

        let filter = filter.with_param(CompanyField::Website, "other");
        assert!(!filter.matches(&company));
    }

    #[test]
    fn test_empty_pattern_matches_anything() {
        let filter = FilterOptions::new().with_param(CompanyField::Phone, "");
        assert!(filter.matches(&Company::new("a", "b")));
    }
}
