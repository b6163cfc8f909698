//! In-memory company store.
//!
//! Backs the service when no database is configured and in tests. Rows keep
//! insertion order, which is also the listing order.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CompanyStore;
use crate::error::{CompanyError, Result};
use crate::models::{Company, FilterOptions};

#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    rows: RwLock<Vec<Company>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. Later duplicates of an identity are dropped.
    pub fn with_companies(companies: impl IntoIterator<Item = Company>) -> Self {
        let mut rows: Vec<Company> = Vec::new();
        for company in companies {
            if !rows.iter().any(|c| c.is(&company.name, &company.code)) {
                rows.push(company);
            }
        }
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Copy of every row, in listing order.
    pub async fn snapshot(&self) -> Vec<Company> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn get(&self, name: &str, code: &str) -> Result<Company> {
        self.rows
            .read()
            .await
            .iter()
            .find(|c| c.is(name, code))
            .cloned()
            .ok_or_else(|| CompanyError::not_found(name, code))
    }

    async fn get_many(&self, filter: &FilterOptions) -> Result<Vec<Company>> {
        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| filter.matches(c))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create(&self, company: &Company) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|c| c.is(&company.name, &company.code)) {
            return Err(CompanyError::already_exists(&company.name, &company.code));
        }
        rows.push(company.clone());
        Ok(())
    }

    async fn update(&self, old_name: &str, old_code: &str, company: &Company) -> Result<()> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|c| c.is(old_name, old_code))
            .ok_or_else(|| CompanyError::not_found(old_name, old_code))?;

        let collides = rows
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.is(&company.name, &company.code));
        if collides {
            return Err(CompanyError::already_exists(&company.name, &company.code));
        }

        rows[index] = company.clone();
        Ok(())
    }

    async fn delete(&self, name: &str, code: &str) -> Result<()> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|c| c.is(name, code))
            .ok_or_else(|| CompanyError::not_found(name, code))?;
        rows.remove(index);
        Ok(())
    }
}
