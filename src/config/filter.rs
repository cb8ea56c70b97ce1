use crate::config::types::Scope;
use glob::Pattern;

const DEFAULT_EXCLUDED_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "pg_toast"];

/// Schema/table/column exclusion per §4.1 Selection rules. Schema/table
/// matching is case-sensitive (PostgreSQL identifiers usually are); the
/// limit-rule matcher in `rules` is case-insensitive per §4.3 — the two are
/// deliberately different rules from different sections of the spec.
pub struct ObjectFilter {
    schemas: Vec<String>,
    exclude_schemas: Vec<String>,
    exclude_tables: Vec<String>,
    exclude_columns: Vec<String>,
}

impl ObjectFilter {
    pub fn new(scope: &Scope) -> Self {
        Self {
            schemas: scope.schemas.clone(),
            exclude_schemas: scope.exclude_schemas.clone(),
            exclude_tables: scope.exclude_tables.clone(),
            exclude_columns: scope.exclude_columns.clone(),
        }
    }

    /// If an include-set is given, it wins over the exclude-set (§4.1).
    pub fn should_include_schema(&self, schema: &str) -> bool {
        if !self.schemas.is_empty() {
            return matches_any(&self.schemas, schema);
        }
        if is_system_schema(schema) {
            return false;
        }
        !matches_any(&self.exclude_schemas, schema)
    }

    /// A table is excluded when its qualified or unqualified name matches
    /// any glob in `exclude_tables`.
    pub fn should_include_table(&self, schema: &str, table: &str) -> bool {
        if !self.should_include_schema(schema) {
            return false;
        }
        let qualified = format!("{schema}.{table}");
        if matches_any(&self.exclude_tables, &qualified) || matches_any(&self.exclude_tables, table)
        {
            return false;
        }
        true
    }

    /// Column exclusion accepts `table.column` or bare `column` forms.
    pub fn should_exclude_column(&self, table: &str, column: &str) -> bool {
        let qualified = format!("{table}.{column}");
        matches_any(&self.exclude_columns, &qualified) || matches_any(&self.exclude_columns, column)
    }
}

pub fn is_system_schema(schema: &str) -> bool {
    DEFAULT_EXCLUDED_SCHEMAS.contains(&schema)
        || schema.starts_with("pg_temp_")
        || schema.starts_with("pg_toast_temp_")
}

fn matches_any(patterns: &[String], name: &str) -> bool {
    patterns.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(schemas: &[&str], ex_schemas: &[&str], ex_tables: &[&str], ex_cols: &[&str]) -> Scope {
        Scope {
            schemas: schemas.iter().map(|s| s.to_string()).collect(),
            exclude_schemas: ex_schemas.iter().map(|s| s.to_string()).collect(),
            exclude_tables: ex_tables.iter().map(|s| s.to_string()).collect(),
            exclude_columns: ex_cols.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_excludes_system_schemas() {
        let filter = ObjectFilter::new(&scope(&[], &[], &[], &[]));
        assert!(!filter.should_include_schema("pg_catalog"));
        assert!(!filter.should_include_schema("information_schema"));
        assert!(filter.should_include_schema("public"));
    }

    #[test]
    fn test_include_wins_over_exclude() {
        let filter = ObjectFilter::new(&scope(&["app"], &["app"], &[], &[]));
        assert!(filter.should_include_schema("app"));
        assert!(!filter.should_include_schema("other"));
    }

    #[test]
    fn test_table_exclusion_qualified_and_bare() {
        let filter = ObjectFilter::new(&scope(&[], &[], &["secrets", "app.audit_*"], &[]));
        assert!(!filter.should_include_table("app", "secrets"));
        assert!(!filter.should_include_table("app", "audit_log"));
        assert!(filter.should_include_table("app", "users"));
    }

    #[test]
    fn test_column_exclusion_forms() {
        let filter = ObjectFilter::new(&scope(&[], &[], &[], &["users.secret", "token"]));
        assert!(filter.should_exclude_column("users", "secret"));
        assert!(filter.should_exclude_column("sessions", "token"));
        assert!(!filter.should_exclude_column("users", "email"));
    }
}
