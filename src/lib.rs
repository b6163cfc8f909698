//! companysvc: company records over HTTP
//!
//! CRUD on companies keyed by `(name, code)`, backed by PostgreSQL or an
//! in-memory store. Creates and deletes are only accepted from callers whose
//! IP geolocates to an allow-listed country. Successful mutations are
//! announced as JSON change events on a best-effort basis.

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod geo;
pub mod models;
pub mod services;

#[cfg(feature = "server")]
pub mod api;

pub use config::AppConfig;
pub use error::{AccessError, CompanyError, Result};
pub use models::{Company, CompanyField, FilterOptions};
pub use services::CompanyService;
