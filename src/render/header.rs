//! Header comment block (§4.6 section 1): generator identity, source
//! database identity, active rule summary, ordering/random flags, and
//! exclusion lists — written as plain SQL comments ahead of the dump body.
use crate::catalog::Catalog;
use crate::config::types::Config;
use std::io::Write;

pub fn render_header(sink: &mut dyn Write, catalog: &Catalog, config: &Config) -> anyhow::Result<()> {
    writeln!(sink, "-- Generated by dbsample {}", env!("CARGO_PKG_VERSION"))?;
    if let Some(dbname) = &config.connection.dbname {
        writeln!(sink, "-- Source database: {dbname}")?;
    }
    if let Some(host) = &config.connection.host {
        writeln!(sink, "-- Source host: {host}:{}", config.connection.port)?;
    }
    writeln!(
        sink,
        "-- Tables: {} ({} schemas)",
        catalog.tables.len(),
        catalog.schemas.len()
    )?;

    if !config.policy.limit_rules.is_empty() {
        writeln!(sink, "-- Limit rules:")?;
        for rule in &config.policy.limit_rules {
            writeln!(sink, "--   {rule}")?;
        }
    }

    if config.policy.ordered {
        let direction = if config.policy.ordered_desc { "DESC" } else { "ASC" };
        writeln!(sink, "-- Ordering: primary key, {direction}")?;
    } else if config.policy.random {
        writeln!(sink, "-- Ordering: random")?;
    }

    if !config.scope.schemas.is_empty() {
        writeln!(sink, "-- Included schemas: {}", config.scope.schemas.join(", "))?;
    }
    if !config.scope.exclude_schemas.is_empty() {
        writeln!(sink, "-- Excluded schemas: {}", config.scope.exclude_schemas.join(", "))?;
    }
    if !config.scope.exclude_tables.is_empty() {
        writeln!(sink, "-- Excluded tables: {}", config.scope.exclude_tables.join(", "))?;
    }
    if !config.scope.exclude_columns.is_empty() {
        writeln!(
            sink,
            "-- Excluded columns (replaced with NULL): {}",
            config.scope.exclude_columns.join(", ")
        )?;
    }

    writeln!(sink)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{Connection, Mode, Observability, Output, Policy, Scope};
    use std::collections::BTreeMap;

    fn test_config() -> Config {
        Config {
            connection: Connection {
                host: Some("db.example.com".to_string()),
                port: 5432,
                dbname: Some("app_prod".to_string()),
                username: None,
                password: None,
                connection_uri: None,
                ssl_mode: "prefer".to_string(),
                ssl_cert: None,
                ssl_key: None,
                ssl_ca: None,
            },
            scope: Scope {
                schemas: vec![],
                exclude_schemas: vec![],
                exclude_tables: vec!["app.audit_log".to_string()],
                exclude_columns: vec!["users.ssn".to_string()],
            },
            policy: Policy {
                limit_rules: vec!["app.orders=500".to_string()],
                ordered: true,
                ordered_desc: false,
                random: false,
            },
            mode: Mode {
                use_staging: None,
                force: false,
                keep: false,
                data_only: false,
                dry_run: false,
                verify: false,
                self_test: false,
                target_version: None,
            },
            output: Output {
                file: None,
                compress: false,
                encoding: "UTF8".to_string(),
            },
            observability: Observability {
                verbose: false,
                log_level: "info".to_string(),
                log_file: None,
                audit_file: None,
                trace: false,
            },
        }
    }

    fn empty_catalog() -> Catalog {
        Catalog {
            schemas: vec![],
            tables: vec![],
            views: vec![],
            types: vec![],
            domains: vec![],
            sequences: vec![],
            indexes: vec![],
            constraints: vec![],
            triggers: vec![],
            extensions: vec![],
            forward_deps: BTreeMap::new(),
            reverse_deps: BTreeMap::new(),
        }
    }

    #[test]
    fn test_header_includes_database_and_rules() {
        let mut buf = Vec::new();
        render_header(&mut buf, &empty_catalog(), &test_config()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("app_prod"));
        assert!(text.contains("app.orders=500"));
        assert!(text.contains("Ordering: primary key, ASC"));
        assert!(text.contains("app.audit_log"));
        assert!(text.contains("users.ssn"));
    }
}
