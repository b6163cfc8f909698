//! Company REST API routes
//!
//! GET    /v1/companies?name=&code=&country=&website=&phone=&limit=
//! GET    /v1/company/:name/:code
//! POST   /v1/company
//! PUT    /v1/company/:name/:code
//! DELETE /v1/company/:name/:code

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use tracing::{info, warn};

use super::error::ApiError;
use super::middleware::CallerIp;
use crate::models::{Company, CompanyField, FilterOptions};
use crate::services::CompanyService;

// ============================================================================
// Router Creation
// ============================================================================

/// Create the company CRUD router
pub fn create_company_router(service: Arc<CompanyService>) -> Router {
    Router::new()
        .route("/v1/companies", get(list_companies))
        .route("/v1/company", post(create_company))
        .route(
            "/v1/company/:name/:code",
            get(get_company).put(update_company).delete(delete_company),
        )
        .with_state(service)
}

// ============================================================================
// Request Parsing
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
struct CompanyKey {
    name: String,
    code: String,
}

fn parse_key(name: &str, code: &str) -> Result<CompanyKey, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name parameter can not be empty"));
    }
    let code = code.trim();
    if code.is_empty() {
        return Err(ApiError::bad_request("code parameter can not be empty"));
    }
    Ok(CompanyKey {
        name: name.to_string(),
        code: code.to_string(),
    })
}

/// First value of `key`; later repeats are ignored.
fn first_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Attribute keys present in the query become filters (trimmed, possibly
/// empty). `limit` is used only when it parses as a non-negative integer.
fn filter_from_query(query: &[(String, String)]) -> FilterOptions {
    let mut filter = FilterOptions::new();
    if let Some(limit) = first_value(query, "limit").and_then(|l| l.trim().parse::<u32>().ok()) {
        filter.limit = Some(limit);
    }
    for field in CompanyField::ALL {
        if let Some(value) = first_value(query, field.as_str()) {
            filter.params.insert(field, value.trim().to_string());
        }
    }
    filter
}

fn parse_company(body: &Bytes) -> Result<Company, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        info!("Parse company: {}", e);
        ApiError::bad_request(e.to_string())
    })
}

fn key_from_path(name: &str, code: &str) -> Result<CompanyKey, ApiError> {
    parse_key(name, code).map_err(|e| {
        info!("Parse query parameters: {}", e.message);
        e
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// List companies matching the query filters
async fn list_companies(
    State(service): State<Arc<CompanyService>>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Company>>, ApiError> {
    let filter = filter_from_query(&query);
    let companies = service.get_many(&filter).await.map_err(|e| {
        warn!("Get many companies: {}", e);
        ApiError::internal("Can not get companies")
    })?;
    Ok(Json(companies))
}

/// Get exactly one company by name and code
async fn get_company(
    State(service): State<Arc<CompanyService>>,
    Path((name, code)): Path<(String, String)>,
) -> Result<Json<Company>, ApiError> {
    let key = key_from_path(&name, &code)?;
    let company = service.get(&key.name, &key.code).await.map_err(|e| {
        warn!("Get company: {}", e);
        ApiError::internal("Can not get company")
    })?;
    Ok(Json(company))
}

async fn create_company(
    State(service): State<Arc<CompanyService>>,
    caller: Option<Extension<CallerIp>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let company = parse_company(&body)?;
    let caller_ip = caller.map(|Extension(CallerIp(ip))| ip);

    service.create(caller_ip, &company).await.map_err(|e| {
        warn!("Create company: {}", e);
        ApiError::internal("Can not create company")
    })?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// Replace a company; the path carries its current identity
async fn update_company(
    State(service): State<Arc<CompanyService>>,
    Path((name, code)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = key_from_path(&name, &code)?;
    let company = parse_company(&body)?;

    service
        .update(&key.name, &key.code, &company)
        .await
        .map_err(|e| {
            warn!("Update company: {}", e);
            ApiError::internal("Can not update company")
        })?;
    Ok((StatusCode::ACCEPTED, Json(company)))
}

async fn delete_company(
    State(service): State<Arc<CompanyService>>,
    caller: Option<Extension<CallerIp>>,
    Path((name, code)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let key = key_from_path(&name, &code)?;
    let caller_ip = caller.map(|Extension(CallerIp(ip))| ip);

    service
        .delete(caller_ip, &key.name, &key.code)
        .await
        .map_err(|e| {
            warn!("Delete company: {}", e);
            ApiError::internal("Can not delete company")
        })?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_key_trims_and_rejects_blank() {
        assert_eq!(
            parse_key(" acme ", "AC-1").unwrap(),
            CompanyKey {
                name: "acme".into(),
                code: "AC-1".into()
            }
        );
        assert_eq!(
            parse_key("  ", "AC-1").unwrap_err().message,
            "name parameter can not be empty"
        );
        assert_eq!(
            parse_key("acme", "").unwrap_err().message,
            "code parameter can not be empty"
        );
    }

    #[test]
    fn test_filter_from_query_reads_known_keys_only() {
        let filter = filter_from_query(&query(&[
            ("limit", "3"),
            ("name", " test "),
            ("phone", ""),
            ("email", "x@example.com"),
        ]));
        assert_eq!(
            filter,
            FilterOptions::new()
                .with_param(CompanyField::Name, "test")
                .with_param(CompanyField::Phone, "")
                .with_limit(3)
        );
    }

    #[test]
    fn test_filter_from_query_ignores_bad_limit() {
        assert_eq!(filter_from_query(&query(&[("limit", "ten")])).limit, None);
        assert_eq!(filter_from_query(&query(&[("limit", "-1")])).limit, None);
        assert_eq!(filter_from_query(&query(&[("limit", "0")])).limit, Some(0));
    }

    #[test]
    fn test_filter_from_query_keeps_first_repeated_value() {
        let filter = filter_from_query(&query(&[
            ("name", "first"),
            ("limit", "2"),
            ("name", "second"),
            ("limit", "9"),
        ]));
        assert_eq!(filter.params.get(&CompanyField::Name).map(String::as_str), Some("first"));
        assert_eq!(filter.limit, Some(2));
    }
}
