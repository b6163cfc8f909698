//! Error types for company storage and the access-controlled write path.

use std::net::IpAddr;

use thiserror::Error;

use crate::geo::ResolveError;

/// Errors returned by company stores and the company service.
#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("company {name}:{code} not found")]
    NotFound { name: String, code: String },

    #[error("company {name}:{code} already exists")]
    AlreadyExists { name: String, code: String },

    #[error("access denied: {0}")]
    AccessDenied(#[from] AccessError),

    #[error("storage: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CompanyError {
    pub fn not_found(name: &str, code: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
            code: code.to_string(),
        }
    }

    pub fn already_exists(name: &str, code: &str) -> Self {
        Self::AlreadyExists {
            name: name.to_string(),
            code: code.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Reasons a caller is refused a create or delete.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("IP undefined: caller address is required for this operation")]
    CallerIpUndefined,

    #[error("resolve ip {ip}: {source}")]
    Resolve {
        ip: IpAddr,
        #[source]
        source: ResolveError,
    },

    #[error("request not allowed from {ip} (country '{country}')")]
    NotAllowed { ip: IpAddr, country: String },
}

pub type Result<T> = std::result::Result<T, CompanyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_found() {
        let e = CompanyError::not_found("acme", "AC-1");
        assert_eq!(e.to_string(), "company acme:AC-1 not found");
        assert!(e.is_not_found());
    }

    #[test]
    fn display_already_exists() {
        let e = CompanyError::already_exists("acme", "AC-1");
        assert_eq!(e.to_string(), "company acme:AC-1 already exists");
        assert!(!e.is_not_found());
    }

    #[test]
    fn display_access_denied_not_allowed() {
        let e: CompanyError = AccessError::NotAllowed {
            ip: "10.0.0.1".parse().unwrap(),
            country: "RU".into(),
        }
        .into();
        assert_eq!(
            e.to_string(),
            "access denied: request not allowed from 10.0.0.1 (country 'RU')"
        );
    }

    #[test]
    fn display_access_denied_ip_undefined() {
        let e: CompanyError = AccessError::CallerIpUndefined.into();
        assert!(e.to_string().contains("IP undefined"));
    }

    #[test]
    fn display_storage() {
        let e = CompanyError::Storage(anyhow::anyhow!("connection reset"));
        assert_eq!(e.to_string(), "storage: connection reset");
    }
}
