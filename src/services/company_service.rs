//! Access-controlled company service
//!
//! Wraps a [`CompanyStore`] and adds two things to the write path:
//!
//! - creates and deletes must come from an IP that geolocates to an
//!   allow-listed country (updates and reads are not checked),
//! - every successful create, update and delete is announced through the
//!   optional [`EventPublisher`].
//!
//! Event delivery is best-effort and runs on a spawned task, so a slow or
//! unreachable sink never delays the caller. A failed publish is logged and
//! never undoes the mutation or changes the result returned to the caller.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::info;

use crate::database::CompanyStore;
use crate::error::{AccessError, Result};
use crate::events::{CompanyEvent, EventPublisher};
use crate::geo::CountryResolver;
use crate::models::{Company, FilterOptions};

pub struct CompanyService {
    store: Arc<dyn CompanyStore>,
    resolver: Arc<dyn CountryResolver>,
    publisher: Option<Arc<dyn EventPublisher>>,
    allowed_countries: Vec<String>,
    channel: String,
}

impl CompanyService {
    /// Service without event publishing. Country codes are compared
    /// case-insensitively.
    pub fn new<I, S>(
        store: Arc<dyn CompanyStore>,
        resolver: Arc<dyn CountryResolver>,
        allowed_countries: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            store,
            resolver,
            publisher: None,
            allowed_countries: allowed_countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            channel: String::new(),
        }
    }

    /// Publish change events to `channel`.
    pub fn with_publisher(
        mut self,
        publisher: Arc<dyn EventPublisher>,
        channel: impl Into<String>,
    ) -> Self {
        self.publisher = Some(publisher);
        self.channel = channel.into();
        self
    }

    pub fn allowed_countries(&self) -> &[String] {
        &self.allowed_countries
    }

    pub fn publishes_events(&self) -> bool {
        self.publisher.is_some()
    }

    pub async fn get(&self, name: &str, code: &str) -> Result<Company> {
        self.store.get(name, code).await
    }

    pub async fn get_many(&self, filter: &FilterOptions) -> Result<Vec<Company>> {
        self.store.get_many(filter).await
    }

    pub async fn create(&self, caller_ip: Option<IpAddr>, company: &Company) -> Result<()> {
        self.check_caller(caller_ip).await?;
        self.store.create(company).await?;
        self.emit(CompanyEvent::created(company));
        Ok(())
    }

    /// Not gated by the country check.
    pub async fn update(&self, old_name: &str, old_code: &str, company: &Company) -> Result<()> {
        self.store.update(old_name, old_code, company).await?;
        self.emit(CompanyEvent::updated(old_name, old_code, company));
        Ok(())
    }

    pub async fn delete(&self, caller_ip: Option<IpAddr>, name: &str, code: &str) -> Result<()> {
        self.check_caller(caller_ip).await?;
        self.store.delete(name, code).await?;
        self.emit(CompanyEvent::deleted(name, code));
        Ok(())
    }

    async fn check_caller(&self, caller_ip: Option<IpAddr>) -> std::result::Result<(), AccessError> {
        let ip = caller_ip.ok_or(AccessError::CallerIpUndefined)?;
        let country = self
            .resolver
            .resolve(ip)
            .await
            .map_err(|source| AccessError::Resolve { ip, source })?;

        let country = country.trim().to_uppercase();
        if self.allowed_countries.iter().any(|c| *c == country) {
            Ok(())
        } else {
            Err(AccessError::NotAllowed { ip, country })
        }
    }

    /// Encode `event` and hand it to the publisher in the background.
    fn emit(&self, event: CompanyEvent) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                info!(event = %event.event_type, error = %e, "Failed to encode company event");
                return;
            }
        };

        let publisher = Arc::clone(publisher);
        let channel = self.channel.clone();
        let event_type = event.event_type;
        tokio::spawn(async move {
            if let Err(e) = publisher.publish(&channel, &payload).await {
                info!(
                    event = %event_type,
                    channel = %channel,
                    error = %e,
                    "Failed to publish company event"
                );
            }
        });
    }
}
