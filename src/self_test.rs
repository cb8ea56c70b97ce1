//! Self-Test Harness (A7): sample → generate SQL → import into a throwaway
//! database → verify, mirroring `original_source/pg_sample/self_test.py`'s
//! create-db/import/verify/cleanup flow without Docker.
use crate::db::connection::build_connection_uri;
use crate::config::types::Connection;
use sqlx::PgPool;
use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct SelfTestReport {
    pub database_created: bool,
    pub import_succeeded: bool,
    pub tables_created: usize,
    pub constraints_valid: bool,
    pub violations: Vec<String>,
    pub errors: Vec<String>,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.import_succeeded && self.constraints_valid && self.errors.is_empty()
    }
}

pub async fn run(admin_connection: &Connection, sql: &str) -> anyhow::Result<SelfTestReport> {
    let mut report = SelfTestReport::default();
    let test_db_name = format!("dbsample_selftest_{}", Uuid::new_v4().simple());

    let mut admin_conn = admin_connection.clone();
    admin_conn.dbname = Some("postgres".to_string());
    let admin_uri = build_connection_uri(&admin_conn)?;
    let admin_pool = PgPool::connect(&admin_uri).await?;

    if let Err(e) = create_database(&admin_pool, &test_db_name).await {
        report.errors.push(format!("failed to create test database: {e}"));
        return Ok(report);
    }
    report.database_created = true;
    info!(database = %test_db_name, "created self-test database");

    let result = run_against(admin_connection, &test_db_name, sql, &mut report).await;
    if let Err(e) = result {
        report.errors.push(e.to_string());
    }

    if let Err(e) = drop_database(&admin_pool, &test_db_name).await {
        warn!(error = %e, "could not drop self-test database");
    }

    Ok(report)
}

async fn run_against(
    admin_connection: &Connection,
    test_db_name: &str,
    sql: &str,
    report: &mut SelfTestReport,
) -> anyhow::Result<()> {
    let mut test_conn = admin_connection.clone();
    test_conn.dbname = Some(test_db_name.to_string());
    let test_uri = build_connection_uri(&test_conn)?;
    let test_pool = PgPool::connect(&test_uri).await?;

    match sqlx::raw_sql(sql).execute(&test_pool).await {
        Ok(_) => report.import_succeeded = true,
        Err(e) => {
            report.errors.push(format!("SQL import failed: {e}"));
            return Ok(());
        }
    }

    report.tables_created = count_tables(&test_pool).await?;
    let violations = invalid_foreign_keys(&test_pool).await?;
    report.constraints_valid = violations.is_empty();
    report.violations = violations;

    Ok(())
}

async fn create_database(admin_pool: &PgPool, name: &str) -> anyhow::Result<()> {
    let quoted = crate::render::quote_ident(name);
    sqlx::query(&format!("DROP DATABASE IF EXISTS {quoted}"))
        .execute(admin_pool)
        .await?;
    sqlx::query(&format!("CREATE DATABASE {quoted}"))
        .execute(admin_pool)
        .await?;
    Ok(())
}

async fn drop_database(admin_pool: &PgPool, name: &str) -> anyhow::Result<()> {
    let quoted = crate::render::quote_ident(name);
    sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(name)
    .execute(admin_pool)
    .await?;
    sqlx::query(&format!("DROP DATABASE IF EXISTS {quoted}"))
        .execute(admin_pool)
        .await?;
    Ok(())
}

async fn count_tables(pool: &PgPool) -> anyhow::Result<usize> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS n FROM pg_tables WHERE schemaname NOT IN ('pg_catalog', 'information_schema')",
    )
    .fetch_one(pool)
    .await?;
    let n: i64 = row.try_get("n")?;
    Ok(n as usize)
}

async fn invalid_foreign_keys(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT conname, conrelid::regclass::text AS table_name
         FROM pg_constraint
         WHERE contype = 'f' AND NOT convalidated",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let name: String = row.get("conname");
            let table: String = row.get("table_name");
            format!("{name} on {table}")
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_passed_requires_import_and_valid_constraints() {
        let mut report = SelfTestReport::default();
        assert!(!report.passed());
        report.import_succeeded = true;
        report.constraints_valid = true;
        assert!(report.passed());
        report.errors.push("boom".to_string());
        assert!(!report.passed());
    }
}
