//! Sampling Engine (C4): per-table initial sampling plus FK-closure fixpoint
//! (§4.4). Produces a `SamplingResult` the output generator renders.
pub mod query;

use crate::catalog::Catalog;
use crate::catalog::constraint::ConstraintType;
use crate::config::filter::ObjectFilter;
use crate::config::types::Config;
use crate::constants::FIXPOINT_ROUND_MARGIN;
use crate::graph::TableRef;
use crate::render::quote_ident;
use crate::render::value::SqlValue;
use crate::rules::RuleSet;
use sqlx::PgPool;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// One table's sampled rows plus the (possibly NULL-substituted) column
/// list they're projected against, in ordinal order.
#[derive(Debug, Clone, Default)]
pub struct TableSample {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

#[derive(Debug, Clone, Default)]
pub struct SamplingResult {
    pub tables: BTreeMap<TableRef, TableSample>,
}

impl SamplingResult {
    pub fn get(&self, t: &TableRef) -> Option<&TableSample> {
        self.tables.get(t)
    }
}

pub struct SamplingEngine<'a> {
    pool: &'a PgPool,
    catalog: &'a Catalog,
    filter: &'a ObjectFilter,
    rules: &'a RuleSet,
    config: &'a Config,
}

impl<'a> SamplingEngine<'a> {
    pub fn new(
        pool: &'a PgPool,
        catalog: &'a Catalog,
        filter: &'a ObjectFilter,
        rules: &'a RuleSet,
        config: &'a Config,
    ) -> Self {
        Self {
            pool,
            catalog,
            filter,
            rules,
            config,
        }
    }

    pub async fn sample_all(&self) -> anyhow::Result<SamplingResult> {
        let mut result = SamplingResult::default();
        let mut presence: BTreeMap<TableRef, BTreeSet<Vec<String>>> = BTreeMap::new();

        for table in &self.catalog.tables {
            let tref = TableRef::new(table.schema.clone(), table.name.clone());
            let columns = query::projected_columns(table, self.filter);
            let limit = self.rules.resolve(&table.schema, &table.name);

            info!(table = %tref.qualified(), ?limit, "sampling table");

            let data_types: Vec<String> = columns.iter().map(|(_, dt, _)| dt.clone()).collect();
            let sql = query::build_initial_select(
                self.pool,
                table,
                &columns,
                &limit,
                self.config.policy.ordered,
                self.config.policy.ordered_desc,
                self.config.policy.random,
            )
            .await?;

            let rows = query::fetch_rows(self.pool, &sql, &data_types).await?;

            if let Some(pk) = &table.primary_key {
                let pk_indices: Vec<usize> = pk
                    .columns
                    .iter()
                    .filter_map(|c| columns.iter().position(|(name, _, _)| name == c))
                    .collect();
                let set = presence.entry(tref.clone()).or_default();
                for row in &rows {
                    set.insert(pk_projection(row, &pk_indices));
                }
            }

            result.tables.insert(
                tref,
                TableSample {
                    columns: columns.into_iter().map(|(name, _, _)| name).collect(),
                    rows,
                },
            );
        }

        self.close_fixpoint(&mut result, &mut presence).await?;
        Ok(result)
    }

    /// Server-side counterpart to `sample_all`: every table is mirrored into
    /// `staging` and closure runs as `INSERT ... SELECT ... WHERE NOT EXISTS`
    /// against the source server, so candidate rows never round-trip through
    /// this process until the final read-back (§4.4.3).
    pub async fn sample_all_staged(
        &self,
        staging: &crate::staging::StagingManager<'_>,
    ) -> anyhow::Result<SamplingResult> {
        let mut mirrors: BTreeMap<TableRef, String> = BTreeMap::new();

        for table in &self.catalog.tables {
            let tref = TableRef::new(table.schema.clone(), table.name.clone());
            let limit = self.rules.resolve(&table.schema, &table.name);
            info!(table = %tref.qualified(), ?limit, "staging: sampling table");

            let sql = query::build_initial_select_native(
                self.pool,
                table,
                &limit,
                self.config.policy.ordered,
                self.config.policy.ordered_desc,
                self.config.policy.random,
            )
            .await?;

            let staging_name = staging.create_table(&table.schema, &table.name).await?;
            staging.copy(&staging_name, &sql).await?;
            if let Some(pk) = &table.primary_key {
                staging.add_index(&staging_name, &pk.columns).await?;
            }
            mirrors.insert(tref, staging_name);
        }

        self.close_fixpoint_staged(staging, &mirrors).await?;

        let mut result = SamplingResult::default();
        for table in &self.catalog.tables {
            let tref = TableRef::new(table.schema.clone(), table.name.clone());
            let Some(staging_name) = mirrors.get(&tref) else {
                continue;
            };
            let projected = query::projected_columns(table, self.filter);
            let col_names: Vec<String> = projected.iter().map(|(n, _, _)| n.clone()).collect();
            let data_types: Vec<String> = projected.iter().map(|(_, dt, _)| dt.clone()).collect();
            let mut rows = staging.read(staging_name, &col_names, &data_types).await?;
            for row in &mut rows {
                for (idx, (_, _, excluded)) in projected.iter().enumerate() {
                    if *excluded {
                        row[idx] = SqlValue::Null;
                    }
                }
            }
            result.tables.insert(
                tref,
                TableSample {
                    columns: col_names,
                    rows,
                },
            );
        }

        Ok(result)
    }

    async fn close_fixpoint_staged(
        &self,
        staging: &crate::staging::StagingManager<'_>,
        mirrors: &BTreeMap<TableRef, String>,
    ) -> anyhow::Result<()> {
        let max_rounds = self.catalog.tables.len() + FIXPOINT_ROUND_MARGIN;

        for round in 0..max_rounds {
            let mut added_any = false;

            for table in &self.catalog.tables {
                let a_ref = TableRef::new(table.schema.clone(), table.name.clone());
                let Some(a_mirror) = mirrors.get(&a_ref) else {
                    continue;
                };

                for fk in self.catalog.foreign_keys_for(&table.schema, &table.name) {
                    let ConstraintType::ForeignKey {
                        columns: local_cols,
                        referenced_schema,
                        referenced_table,
                        referenced_columns: ref_cols,
                        ..
                    } = &fk.constraint_type
                    else {
                        continue;
                    };
                    let b_ref = TableRef::new(referenced_schema.clone(), referenced_table.clone());
                    let Some(b_mirror) = mirrors.get(&b_ref) else {
                        continue;
                    };
                    let Some(b_table) = self.catalog.find_table(referenced_schema, referenced_table)
                    else {
                        continue;
                    };
                    if b_table.primary_key.is_none() {
                        warn!(
                            table = %b_ref.qualified(),
                            "FK references a table with no primary key; skipping closure"
                        );
                        continue;
                    }

                    let a_qualified = format!(
                        "{}.{}",
                        quote_ident(staging.schema_name()),
                        quote_ident(a_mirror)
                    );
                    let missing_keys_sql =
                        staging.not_exists_closure_sql(&a_qualified, local_cols, b_mirror, ref_cols);

                    let b_qualified =
                        format!("{}.{}", quote_ident(&b_ref.schema), quote_ident(&b_ref.name));
                    let ref_cols_list = ref_cols
                        .iter()
                        .map(|c| quote_ident(c))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let select_sql = format!(
                        "SELECT b.* FROM {b_qualified} b WHERE ({ref_cols_list}) IN ({missing_keys_sql})"
                    );

                    let copied = staging.copy(b_mirror, &select_sql).await?;
                    if copied > 0 {
                        added_any = true;
                    }
                }
            }

            if !added_any {
                info!(rounds = round + 1, "FK closure reached fixpoint (staged)");
                return Ok(());
            }
        }

        anyhow::bail!(
            "FK closure did not converge within {} rounds",
            max_rounds
        );
    }

    /// §4.4.2: repeat the FK closure walk until a full pass adds no rows,
    /// capped at `|tables| + FIXPOINT_ROUND_MARGIN` rounds.
    async fn close_fixpoint(
        &self,
        result: &mut SamplingResult,
        presence: &mut BTreeMap<TableRef, BTreeSet<Vec<String>>>,
    ) -> anyhow::Result<()> {
        let max_rounds = self.catalog.tables.len() + FIXPOINT_ROUND_MARGIN;

        for round in 0..max_rounds {
            let mut added_any = false;

            for table in &self.catalog.tables {
                let a_ref = TableRef::new(table.schema.clone(), table.name.clone());
                for fk in self.catalog.foreign_keys_for(&table.schema, &table.name) {
                    let ConstraintType::ForeignKey {
                        columns: local_cols,
                        referenced_schema,
                        referenced_table,
                        referenced_columns: ref_cols,
                        ..
                    } = &fk.constraint_type
                    else {
                        continue;
                    };
                    let b_ref = TableRef::new(referenced_schema.clone(), referenced_table.clone());

                    if !result.tables.contains_key(&a_ref) || !result.tables.contains_key(&b_ref) {
                        continue;
                    }

                    let Some(b_table) = self.catalog.find_table(referenced_schema, referenced_table)
                    else {
                        continue;
                    };
                    if b_table.primary_key.is_none() {
                        warn!(
                            table = %b_ref.qualified(),
                            "FK references a table with no primary key; skipping closure"
                        );
                        continue;
                    }

                    let added = self
                        .close_one_fk(&a_ref, local_cols, &b_ref, ref_cols, result, presence)
                        .await?;
                    added_any |= added;
                }
            }

            if !added_any {
                info!(rounds = round + 1, "FK closure reached fixpoint");
                return Ok(());
            }
        }

        anyhow::bail!(
            "FK closure did not converge within {} rounds",
            max_rounds
        );
    }

    #[allow(clippy::too_many_arguments)]
    async fn close_one_fk(
        &self,
        a_ref: &TableRef,
        local_cols: &[String],
        b_ref: &TableRef,
        ref_cols: &[String],
        result: &mut SamplingResult,
        presence: &mut BTreeMap<TableRef, BTreeSet<Vec<String>>>,
    ) -> anyhow::Result<bool> {
        let a_sample = result.tables.get(a_ref).unwrap();
        let local_indices: Vec<usize> = local_cols
            .iter()
            .filter_map(|c| a_sample.columns.iter().position(|n| n == c))
            .collect();
        if local_indices.len() != local_cols.len() {
            return Ok(false);
        }

        let mut v: BTreeSet<Vec<String>> = BTreeSet::new();
        for row in &a_sample.rows {
            if let Some(tuple) = pk_projection_checked(row, &local_indices) {
                v.insert(tuple);
            }
        }

        let empty = BTreeSet::new();
        let p = presence.get(b_ref).unwrap_or(&empty);
        let missing: Vec<&Vec<String>> = v.iter().filter(|t| !p.contains(*t)).collect();
        if missing.is_empty() {
            return Ok(false);
        }

        let b_table = self
            .catalog
            .find_table(&b_ref.schema, &b_ref.name)
            .expect("referenced table exists in catalog");
        let columns = query::projected_columns(b_table, self.filter);
        let data_types: Vec<String> = columns.iter().map(|(_, dt, _)| dt.clone()).collect();
        let qualified = format!("{}.{}", quote_ident(&b_ref.schema), quote_ident(&b_ref.name));
        let select_cols = columns
            .iter()
            .map(|(name, _, excluded)| {
                if *excluded {
                    format!("NULL AS {}", quote_ident(name))
                } else {
                    format!("{}::text AS {}", quote_ident(name), quote_ident(name))
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let ref_cols_list = ref_cols
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let tuples = missing
            .iter()
            .map(|tuple| {
                format!(
                    "({})",
                    tuple
                        .iter()
                        .map(|v| crate::render::escape_string(v))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_cols} FROM {qualified} WHERE ({ref_cols_list}) IN ({tuples})"
        );

        let fetched = query::fetch_rows(self.pool, &sql, &data_types).await?;

        let b_pk_indices: Vec<usize> = b_table
            .primary_key
            .as_ref()
            .map(|pk| {
                pk.columns
                    .iter()
                    .filter_map(|c| columns.iter().position(|(name, _, _)| name == c))
                    .collect()
            })
            .unwrap_or_default();

        let entry = result.tables.entry(b_ref.clone()).or_insert_with(|| TableSample {
            columns: columns.iter().map(|(n, _, _)| n.clone()).collect(),
            rows: Vec::new(),
        });
        let presence_set = presence.entry(b_ref.clone()).or_default();

        let mut added = false;
        for row in fetched {
            if let Some(tuple) = pk_projection_checked(&row, &b_pk_indices)
                && presence_set.insert(tuple)
            {
                entry.rows.push(row);
                added = true;
            } else if b_pk_indices.is_empty() {
                entry.rows.push(row);
                added = true;
            }
        }

        Ok(added)
    }
}

fn pk_projection(row: &[SqlValue], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|&i| row.get(i).and_then(SqlValue::as_comparable).unwrap_or_default())
        .collect()
}

fn pk_projection_checked(row: &[SqlValue], indices: &[usize]) -> Option<Vec<String>> {
    let mut out = Vec::with_capacity(indices.len());
    for &i in indices {
        match row.get(i).and_then(SqlValue::as_comparable) {
            Some(v) => out.push(v),
            None => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pk_projection_checked_skips_null_components() {
        let row = vec![SqlValue::Integer(1), SqlValue::Null];
        assert_eq!(pk_projection_checked(&row, &[0, 1]), None);
        assert_eq!(
            pk_projection_checked(&row, &[0]),
            Some(vec!["1".to_string()])
        );
    }
}
