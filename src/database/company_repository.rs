//! PostgreSQL company repository
//!
//! Rows live in the `companies` table keyed by `(name, code)`. All SQL is
//! runtime-checked (`sqlx::query`, not `sqlx::query!`) so building does not
//! need a live database.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;

use super::filter::{build_filter_clause, FilterBind};
use super::CompanyStore;
use crate::error::{CompanyError, Result};
use crate::models::{Company, FilterOptions};

const SELECT_COMPANY: &str = "SELECT name, code, country, website, phone FROM companies";

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    name: String,
    code: String,
    country: String,
    website: String,
    phone: String,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            name: row.name,
            code: row.code,
            country: row.country,
            website: row.website,
            phone: row.phone,
        }
    }
}

/// Company store backed by PostgreSQL.
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn storage_error(action: &str, err: sqlx::Error) -> CompanyError {
    CompanyError::Storage(anyhow!(err).context(format!("{action} company in storage")))
}

#[async_trait]
impl CompanyStore for PgCompanyRepository {
    async fn get(&self, name: &str, code: &str) -> Result<Company> {
        let query = format!("{SELECT_COMPANY} WHERE name = $1 AND code = $2");
        tracing::trace!(%query, "executing");

        let row = sqlx::query_as::<_, CompanyRow>(&query)
            .bind(name)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("get", e))?;

        row.map(Company::from)
            .ok_or_else(|| CompanyError::not_found(name, code))
    }

    async fn get_many(&self, filter: &FilterOptions) -> Result<Vec<Company>> {
        let clause = build_filter_clause(0, Some(filter));
        let query = format!("{SELECT_COMPANY} WHERE {}", clause.sql);
        tracing::trace!(%query, "executing");

        let mut statement = sqlx::query_as::<_, CompanyRow>(&query);
        for bind in clause.binds {
            statement = match bind {
                FilterBind::Pattern(pattern) => statement.bind(pattern),
                FilterBind::Limit(limit) => statement.bind(limit),
            };
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list", e))?;

        Ok(rows.into_iter().map(Company::from).collect())
    }

    async fn create(&self, company: &Company) -> Result<()> {
        let query = "INSERT INTO companies (name, code, country, website, phone) \
                     VALUES ($1, $2, $3, $4, $5)";
        tracing::trace!(%query, "executing");

        sqlx::query(query)
            .bind(&company.name)
            .bind(&company.code)
            .bind(&company.country)
            .bind(&company.website)
            .bind(&company.phone)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CompanyError::already_exists(&company.name, &company.code)
                } else {
                    storage_error("create", e)
                }
            })?;

        Ok(())
    }

    async fn update(&self, old_name: &str, old_code: &str, company: &Company) -> Result<()> {
        let query = "UPDATE companies \
                     SET name = $1, code = $2, country = $3, website = $4, phone = $5 \
                     WHERE name = $6 AND code = $7";
        tracing::trace!(%query, "executing");

        let result = sqlx::query(query)
            .bind(&company.name)
            .bind(&company.code)
            .bind(&company.country)
            .bind(&company.website)
            .bind(&company.phone)
            .bind(old_name)
            .bind(old_code)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CompanyError::already_exists(&company.name, &company.code)
                } else {
                    storage_error("update", e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(CompanyError::not_found(old_name, old_code));
        }
        Ok(())
    }

    async fn delete(&self, name: &str, code: &str) -> Result<()> {
        let query = "DELETE FROM companies WHERE name = $1 AND code = $2";
        tracing::trace!(%query, "executing");

        let result = sqlx::query(query)
            .bind(name)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(CompanyError::not_found(name, code));
        }
        Ok(())
    }
}
