//! Staging Manager (C7): server-side staging schema used when sampling a
//! large or highly-connected database, so FK closure runs as SQL against the
//! source server instead of round-tripping every candidate row through the
//! client. Mirrors `db::cleaner`'s create/drop-schema style.
use crate::constants::DEFAULT_STAGING_SCHEMA;
use crate::render::quote_ident;
use crate::render::value::SqlValue;
use crate::sampling::query::fetch_rows;
use sqlx::{Executor, PgPool};
use tracing::warn;

pub struct StagingManager<'a> {
    pool: &'a PgPool,
    schema: String,
    created: bool,
}

impl<'a> StagingManager<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            schema: DEFAULT_STAGING_SCHEMA.to_string(),
            created: false,
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Create the staging schema. On a privilege error this is a soft
    /// failure: log and return `Ok(false)` so the caller can downgrade to
    /// direct mode rather than aborting the whole run.
    pub async fn create(&mut self, force: bool) -> anyhow::Result<bool> {
        if self.created {
            return Ok(true);
        }
        if force {
            self.drop().await.ok();
        }

        let stmt = format!("CREATE SCHEMA {}", quote_ident(&self.schema));
        match self.pool.execute(stmt.as_str()).await {
            Ok(_) => {
                self.created = true;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "could not create staging schema; falling back to direct sampling");
                Ok(false)
            }
        }
    }

    /// Idempotent: a no-op if the schema was never created (or already dropped).
    pub async fn drop(&mut self) -> anyhow::Result<()> {
        if !self.created {
            return Ok(());
        }
        let stmt = format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(&self.schema));
        self.pool.execute(stmt.as_str()).await?;
        self.created = false;
        Ok(())
    }

    /// Mirror a source table's column shape into the staging schema.
    /// Returns the unqualified staging table name.
    pub async fn create_table(&self, source_schema: &str, source_table: &str) -> anyhow::Result<String> {
        let staging_name = format!("{source_schema}__{source_table}");
        let stmt = format!(
            "CREATE TABLE {}.{} (LIKE {}.{} INCLUDING DEFAULTS)",
            quote_ident(&self.schema),
            quote_ident(&staging_name),
            quote_ident(source_schema),
            quote_ident(source_table),
        );
        self.pool.execute(stmt.as_str()).await?;
        Ok(staging_name)
    }

    /// Run `select_sql` server-side and insert its output into the staging
    /// table, returning the number of rows copied.
    pub async fn copy(&self, staging_table: &str, select_sql: &str) -> anyhow::Result<u64> {
        let stmt = format!(
            "INSERT INTO {}.{} {}",
            quote_ident(&self.schema),
            quote_ident(staging_table),
            select_sql
        );
        let result = self.pool.execute(stmt.as_str()).await?;
        Ok(result.rows_affected())
    }

    /// Mirror an index over `columns` onto the staging table, so FK-closure
    /// `IN`/`NOT EXISTS` lookups against it aren't sequential scans.
    pub async fn add_index(&self, staging_table: &str, columns: &[String]) -> anyhow::Result<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let idx_name = format!("{}_{}_idx", staging_table, columns.join("_"));
        let cols = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let stmt = format!(
            "CREATE INDEX {} ON {}.{} ({})",
            quote_ident(&idx_name),
            quote_ident(&self.schema),
            quote_ident(staging_table),
            cols
        );
        self.pool.execute(stmt.as_str()).await?;
        Ok(())
    }

    /// Read a staging table's contents back, text-cast, for final rendering.
    /// `data_types` carries each column's declared Postgres type, in the
    /// same order as `columns`, for literal classification.
    pub async fn read(
        &self,
        staging_table: &str,
        columns: &[String],
        data_types: &[String],
    ) -> anyhow::Result<Vec<Vec<SqlValue>>> {
        let select_cols = columns
            .iter()
            .map(|c| format!("{}::text AS {}", quote_ident(c), quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_cols} FROM {}.{}",
            quote_ident(&self.schema),
            quote_ident(staging_table)
        );
        fetch_rows(self.pool, &sql, data_types).await
    }

    /// Build the `NOT EXISTS`-based closure predicate for rows of
    /// `referenced_staging_table` not yet present there, keyed by
    /// `ref_cols`, from `source_staging_table`'s `local_cols` values.
    pub fn not_exists_closure_sql(
        &self,
        source_qualified: &str,
        local_cols: &[String],
        referenced_staging_table: &str,
        ref_cols: &[String],
    ) -> String {
        not_exists_closure_sql(
            &self.schema,
            source_qualified,
            local_cols,
            referenced_staging_table,
            ref_cols,
        )
    }
}

fn not_exists_closure_sql(
    staging_schema: &str,
    source_qualified: &str,
    local_cols: &[String],
    referenced_staging_table: &str,
    ref_cols: &[String],
) -> String {
    let select_local = local_cols
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let join_predicate = local_cols
        .iter()
        .zip(ref_cols.iter())
        .map(|(l, r)| format!("s.{} = t.{}", quote_ident(l), quote_ident(r)))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!(
        "SELECT {select_local} FROM {source_qualified} s WHERE NOT EXISTS (SELECT 1 FROM {}.{} t WHERE {join_predicate})",
        quote_ident(staging_schema),
        quote_ident(referenced_staging_table),
    )
}

/// Best-effort, idempotent schema drop used on cancellation (§5): a fresh
/// connection since the in-flight run's pool may be mid-query when a
/// shutdown signal arrives. Safe to call whether or not this process ever
/// created the schema.
pub async fn drop_schema_by_name(pool: &PgPool, schema: &str) -> anyhow::Result<()> {
    let stmt = format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(schema));
    pool.execute(stmt.as_str()).await?;
    Ok(())
}

/// Auto-enable staging mode when the operator left it unset: per §4.4,
/// table count over the threshold or any table with more FKs than the
/// threshold makes per-row closure round-trips expensive enough that
/// server-side staging wins.
pub fn should_auto_enable(table_count: usize, max_fks_on_any_table: usize) -> bool {
    table_count > crate::constants::STAGING_AUTO_TABLE_COUNT
        || max_fks_on_any_table > crate::constants::STAGING_AUTO_FK_COUNT
}
