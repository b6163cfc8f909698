//! Company change events and their delivery.
//!
//! The company service builds a [`CompanyEvent`] after each successful
//! mutation and hands the JSON encoding to an [`EventPublisher`]. Delivery is
//! best-effort.

pub mod publisher;
pub mod types;

pub use publisher::{EventPublisher, HttpEventPublisher, PublishError};
pub use types::{CompanyEvent, CompanyEventType};
