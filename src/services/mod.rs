//! Business services composed over the storage, geolocation and event ports.

pub mod company_service;

pub use company_service::CompanyService;
