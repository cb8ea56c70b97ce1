//! Per-table SELECT construction (§4.4.1): column projection with NULL
//! substitution for excluded columns, CONDITIONAL predicates, ordering, and
//! the policy-driven LIMIT clause.
use crate::catalog::table::Table;
use crate::config::filter::ObjectFilter;
use crate::render::quote_ident;
use crate::render::value::SqlValue;
use crate::rules::LimitType;
use futures_util::TryStreamExt;
use sqlx::PgPool;
use sqlx::Row;

/// Column name, declared Postgres type, and NULL-substitution flag for a
/// table's projection, in ordinal order.
pub fn projected_columns(table: &Table, filter: &ObjectFilter) -> Vec<(String, String, bool)> {
    table
        .columns
        .iter()
        .map(|c| {
            let excluded = filter.should_exclude_column(&table.name, &c.name);
            (c.name.clone(), c.data_type.clone(), excluded)
        })
        .collect()
}

fn select_list(columns: &[(String, String, bool)]) -> String {
    if columns.is_empty() || columns.iter().all(|(_, _, excluded)| *excluded) {
        return "NULL".to_string();
    }
    columns
        .iter()
        .map(|(name, _, excluded)| {
            if *excluded {
                format!("NULL AS {}", quote_ident(name))
            } else {
                format!("{}::text AS {}", quote_ident(name), quote_ident(name))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the full initial-sampling SELECT for `table` under `limit`.
pub async fn build_initial_select(
    pool: &PgPool,
    table: &Table,
    columns: &[(String, String, bool)],
    limit: &LimitType,
    ordered: bool,
    ordered_desc: bool,
    random: bool,
) -> anyhow::Result<String> {
    let qualified = format!("{}.{}", quote_ident(&table.schema), quote_ident(&table.name));
    let mut sql = format!("SELECT {} FROM {}", select_list(columns), qualified);

    if let LimitType::Conditional(expr) = limit {
        sql.push_str(&format!(" WHERE {expr}"));
    }

    if ordered {
        let direction = if ordered_desc { "DESC" } else { "ASC" };
        if let Some(pk) = &table.primary_key {
            let cols = pk
                .columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {cols} {direction}"));
        } else {
            sql.push_str(&format!(" ORDER BY ctid {direction}"));
        }
    } else if random {
        sql.push_str(" ORDER BY random()");
    }

    match limit {
        LimitType::Numeric(n) => sql.push_str(&format!(" LIMIT {n}")),
        LimitType::Percentage(pct) => {
            let count_sql = format!("SELECT COUNT(*) AS n FROM {qualified}");
            let row = sqlx::query(&count_sql).fetch_one(pool).await?;
            let total: i64 = row.try_get("n")?;
            let n = ((total as f64 * pct / 100.0).floor() as i64).max(1);
            sql.push_str(&format!(" LIMIT {n}"));
        }
        LimitType::Full | LimitType::Conditional(_) => {}
    }

    Ok(sql)
}

/// Like `build_initial_select`, but projects every column unmodified rather
/// than text-casting and NULL-substituting excluded ones. Used to populate a
/// staging mirror table, whose columns keep the source's native types —
/// column exclusion is enforced later, when the mirror is read back.
pub async fn build_initial_select_native(
    pool: &PgPool,
    table: &Table,
    limit: &LimitType,
    ordered: bool,
    ordered_desc: bool,
    random: bool,
) -> anyhow::Result<String> {
    let qualified = format!("{}.{}", quote_ident(&table.schema), quote_ident(&table.name));
    let mut sql = format!("SELECT * FROM {qualified}");

    if let LimitType::Conditional(expr) = limit {
        sql.push_str(&format!(" WHERE {expr}"));
    }

    if ordered {
        let direction = if ordered_desc { "DESC" } else { "ASC" };
        if let Some(pk) = &table.primary_key {
            let cols = pk
                .columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {cols} {direction}"));
        } else {
            sql.push_str(&format!(" ORDER BY ctid {direction}"));
        }
    } else if random {
        sql.push_str(" ORDER BY random()");
    }

    match limit {
        LimitType::Numeric(n) => sql.push_str(&format!(" LIMIT {n}")),
        LimitType::Percentage(pct) => {
            let count_sql = format!("SELECT COUNT(*) AS n FROM {qualified}");
            let row = sqlx::query(&count_sql).fetch_one(pool).await?;
            let total: i64 = row.try_get("n")?;
            let n = ((total as f64 * pct / 100.0).floor() as i64).max(1);
            sql.push_str(&format!(" LIMIT {n}"));
        }
        LimitType::Full | LimitType::Conditional(_) => {}
    }

    Ok(sql)
}

/// Stream the rows for `sql` row by row rather than materializing the whole
/// result set on the driver side (`fetch` + `try_next`, not `fetch_all`), so
/// a single huge table's sample doesn't double-buffer in the Postgres wire
/// decoder on top of the `Vec` this builds. Each `::text`-cast column is
/// classified into a `SqlValue` using the matching entry in `data_types`,
/// which must be in the same ordinal order as the query's projection.
pub async fn fetch_rows(
    pool: &PgPool,
    sql: &str,
    data_types: &[String],
) -> anyhow::Result<Vec<Vec<SqlValue>>> {
    let mut stream = sqlx::query(sql).fetch(pool);
    let mut out = Vec::new();
    while let Some(row) = stream.try_next().await? {
        let mut values = Vec::with_capacity(data_types.len());
        for (idx, data_type) in data_types.iter().enumerate() {
            let raw: Option<String> = row.try_get(idx)?;
            values.push(SqlValue::from_text(data_type, raw));
        }
        out.push(values);
    }
    Ok(out)
}
