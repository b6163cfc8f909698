//! Filter-to-SQL translation for company listings.
//!
//! Produces the tail of a `WHERE` clause plus the values to bind, in
//! placeholder order. The caller prepends `SELECT ... WHERE`.

use crate::models::FilterOptions;

/// A value to bind for one placeholder of a [`FilterClause`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterBind {
    /// `ILIKE` pattern, already wrapped in `%` wildcards.
    Pattern(String),
    /// Row cap for the trailing `LIMIT`.
    Limit(i64),
}

/// Parameterized predicate generated from [`FilterOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub sql: String,
    pub binds: Vec<FilterBind>,
}

/// Build the predicate for `filter`, numbering placeholders from `start + 1`.
///
/// Each attribute becomes `<column> ILIKE $n` and the conditions are joined
/// with `AND`. A limit (zero included) appends ` LIMIT $n` last. Without
/// conditions the predicate is `TRUE`.
pub fn build_filter_clause(start: usize, filter: Option<&FilterOptions>) -> FilterClause {
    let Some(filter) = filter.filter(|f| !f.is_empty()) else {
        return FilterClause {
            sql: "TRUE".to_string(),
            binds: Vec::new(),
        };
    };

    let mut index = start;
    let mut conditions = Vec::with_capacity(filter.params.len());
    let mut binds = Vec::with_capacity(filter.params.len() + 1);

    for (field, pattern) in &filter.params {
        index += 1;
        conditions.push(format!("{} ILIKE ${}", field.as_str(), index));
        binds.push(FilterBind::Pattern(contains_pattern(pattern)));
    }

    let mut sql = if conditions.is_empty() {
        "TRUE".to_string()
    } else {
        conditions.join(" AND ")
    };

    if let Some(limit) = filter.limit {
        index += 1;
        sql.push_str(&format!(" LIMIT ${}", index));
        binds.push(FilterBind::Limit(i64::from(limit)));
    }

    FilterClause { sql, binds }
}

/// Wrap `value` for a literal substring `ILIKE` match. `\`, `%` and `_` are
/// escaped with the default backslash escape character.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompanyField;

    #[test]
    fn test_no_filter_matches_everything() {
        let clause = build_filter_clause(0, None);
        assert_eq!(clause.sql, "TRUE");
        assert!(clause.binds.is_empty());

        let clause = build_filter_clause(0, Some(&FilterOptions::new()));
        assert_eq!(clause.sql, "TRUE");
        assert!(clause.binds.is_empty());
    }

    #[test]
    fn test_limit_only() {
        let filter = FilterOptions::new().with_limit(0);
        let clause = build_filter_clause(0, Some(&filter));
        assert_eq!(clause.sql, "TRUE LIMIT $1");
        assert_eq!(clause.binds, vec![FilterBind::Limit(0)]);
    }

    #[test]
    fn test_single_param_with_limit() {
        let filter = FilterOptions::new()
            .with_param(CompanyField::Name, "")
            .with_limit(0);
        let clause = build_filter_clause(0, Some(&filter));
        assert_eq!(clause.sql, "name ILIKE $1 LIMIT $2");
        assert_eq!(
            clause.binds,
            vec![FilterBind::Pattern("%%".into()), FilterBind::Limit(0)]
        );

        let filter = FilterOptions::new()
            .with_param(CompanyField::Code, "")
            .with_limit(0);
        let clause = build_filter_clause(0, Some(&filter));
        assert_eq!(clause.sql, "code ILIKE $1 LIMIT $2");
    }

    #[test]
    fn test_params_are_anded_and_placeholders_follow_start() {
        let filter = FilterOptions::new()
            .with_param(CompanyField::Country, "ua")
            .with_param(CompanyField::Website, "example")
            .with_limit(3);
        let clause = build_filter_clause(2, Some(&filter));

        let (predicate, limit) = clause.sql.split_once(" LIMIT ").unwrap();
        assert_eq!(limit, "$5");

        let mut conditions: Vec<&str> = predicate.split(" AND ").collect();
        conditions.sort_unstable();
        assert_eq!(conditions.len(), 2);
        assert!(conditions[0].starts_with("country ILIKE $"));
        assert!(conditions[1].starts_with("website ILIKE $"));

        assert_eq!(clause.binds.len(), 3);
        assert!(clause.binds.contains(&FilterBind::Pattern("%ua%".into())));
        assert!(clause.binds.contains(&FilterBind::Pattern("%example%".into())));
        assert_eq!(clause.binds.last(), Some(&FilterBind::Limit(3)));
    }

    #[test]
    fn test_like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(contains_pattern("plain"), "%plain%");
    }
}
