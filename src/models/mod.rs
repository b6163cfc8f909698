//! Domain models shared by the store, service and API layers.

pub mod company;

pub use company::{Company, CompanyField, FilterOptions};
