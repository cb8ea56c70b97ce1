//! Fetch tables + columns via pg_catalog (§4.1 Catalog Reader).
use anyhow::Result;
use sqlx::postgres::PgConnection;
use tracing::info;

use super::comments::Commentable;
use super::id::{DbObjectId, DependsOn};
use super::utils::is_system_schema;
use crate::render::quote_ident;
use itertools::Itertools;

/// Mirrors `original_source/dbsample/schema.py`'s `TableType`: only ordinary
/// and partitioned tables are ever sampled (foreign/temporary tables are
/// excluded at discovery time, per 4.1 Selection rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Ordinary,
    Partitioned,
}

impl TableKind {
    fn from_relkind(relkind: &str) -> Option<Self> {
        match relkind {
            "r" => Some(TableKind::Ordinary),
            "p" => Some(TableKind::Partitioned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub default: Option<String>,
    pub not_null: bool,
    pub generated: Option<String>,
    /// Set for IDENTITY columns and SERIAL-backed sequences (`pg_get_serial_sequence`).
    pub identity_sequence: Option<String>,
    pub comment: Option<String>,
    pub depends_on: Vec<DbObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    /// Set when this table is a declarative-partitioning child.
    pub parent_table: Option<(String, String)>,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub comment: Option<String>,

    table_dependencies: Vec<DbObjectId>,
    all_dependencies: Vec<DbObjectId>,
}

impl Table {
    /// Construct a table descriptor directly (used by rendering code that
    /// builds a synthetic `Table` rather than reading one from the catalog).
    pub fn new(
        schema: String,
        name: String,
        columns: Vec<Column>,
        primary_key: Option<PrimaryKey>,
        comment: Option<String>,
        dependencies: Vec<DbObjectId>,
    ) -> Self {
        let mut table_deps = vec![DbObjectId::Schema {
            name: schema.clone(),
        }];
        for dep in dependencies {
            if !table_deps.contains(&dep) {
                table_deps.push(dep);
            }
        }
        let mut table = Self {
            schema,
            name,
            kind: TableKind::Ordinary,
            parent_table: None,
            columns,
            primary_key,
            comment,
            table_dependencies: table_deps.clone(),
            all_dependencies: table_deps,
        };
        table.update_all_dependencies();
        table
    }

    pub fn id(&self) -> DbObjectId {
        DbObjectId::Table {
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn is_partitioned(&self) -> bool {
        self.kind == TableKind::Partitioned
    }

    fn compute_all_dependencies(&self) -> Vec<DbObjectId> {
        let mut all_deps = self.table_dependencies.clone();
        for column in &self.columns {
            for col_dep in &column.depends_on {
                if !all_deps.contains(col_dep) {
                    all_deps.push(col_dep.clone());
                }
            }
        }
        all_deps
    }

    pub fn update_all_dependencies(&mut self) {
        self.all_dependencies = self.compute_all_dependencies();
    }
}

impl DependsOn for Table {
    fn id(&self) -> DbObjectId {
        self.id()
    }

    fn depends_on(&self) -> &[DbObjectId] {
        &self.all_dependencies
    }
}

impl Commentable for Table {
    fn comment(&self) -> &Option<String> {
        &self.comment
    }
}

async fn fetch_all_tables(
    conn: &mut PgConnection,
) -> Result<Vec<(String, String, String, Option<String>)>> {
    let rows = sqlx::query!(
        r#"
        SELECT
            n.nspname AS table_schema,
            c.relname AS table_name,
            c.relkind::text AS "relkind!",
            d.description AS "table_comment?"
        FROM pg_class c
        JOIN pg_namespace n ON c.relnamespace = n.oid
        LEFT JOIN pg_description d ON d.objoid = c.oid AND d.objsubid = 0
        WHERE c.relkind IN ('r', 'p')
          AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
          AND n.nspname NOT LIKE 'pg_temp_%'
          AND n.nspname NOT LIKE 'pg_toast_temp_%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.objid = c.oid
              AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, c.relname
        "#
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| (r.table_schema, r.table_name, r.relkind, r.table_comment))
        .collect())
}

async fn fetch_partition_parents(
    conn: &mut PgConnection,
) -> Result<std::collections::BTreeMap<(String, String), (String, String)>> {
    let rows = sqlx::query!(
        r#"
        SELECT
            cn.nspname AS "child_schema!",
            c.relname AS "child_name!",
            pn.nspname AS "parent_schema!",
            p.relname AS "parent_name!"
        FROM pg_inherits i
        JOIN pg_class c ON i.inhrelid = c.oid
        JOIN pg_namespace cn ON c.relnamespace = cn.oid
        JOIN pg_class p ON i.inhparent = p.oid
        JOIN pg_namespace pn ON p.relnamespace = pn.oid
        WHERE p.relkind = 'p'
        "#
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                (r.child_schema, r.child_name),
                (r.parent_schema, r.parent_name),
            )
        })
        .collect())
}

#[derive(Debug)]
struct ColumnRow {
    table_schema: String,
    table_name: String,
    column_name: String,
    data_type: String,
    type_schema: Option<String>,
    type_name: Option<String>,
    column_expr: Option<String>,
    attgenerated: Option<String>,
    not_null: bool,
    attndims: i32,
    column_comment: Option<String>,
    is_extension_type: bool,
    extension_name: Option<String>,
    type_typtype: Option<String>,
    identity_sequence: Option<String>,
}

async fn fetch_table_columns(conn: &mut PgConnection) -> Result<Vec<ColumnRow>> {
    let rows = sqlx::query!(
        r#"
        SELECT
          n.nspname    AS table_schema,
          c.relname    AS table_name,
          a.attname    AS column_name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) AS "data_type!",
          CASE
            WHEN t.typelem != 0 THEN elem_tn.nspname
            ELSE tn.nspname
          END AS "type_schema?",
          CASE
            WHEN t.typelem != 0 THEN elem_t.typname
            ELSE t.typname
          END AS "type_name?",
          pg_catalog.pg_get_expr(ad.adbin, ad.adrelid)  AS column_expr,
          a.attgenerated::text AS attgenerated,
          a.attnotnull AS "not_null!",
          COALESCE(a.attndims, 0)::int AS "attndims!: i32",
          d.description AS "column_comment?",
          ext_types.extname IS NOT NULL AS "is_extension_type!: bool",
          ext_types.extname AS "extension_name?",
          CASE
            WHEN t.typelem != 0 THEN elem_t.typtype::text
            ELSE t.typtype::text
          END AS "type_typtype?",
          pg_catalog.pg_get_serial_sequence(
              quote_ident(n.nspname) || '.' || quote_ident(c.relname), a.attname
          ) AS "identity_sequence?"
        FROM pg_attribute a
        LEFT JOIN pg_attrdef ad
          ON a.attrelid = ad.adrelid
         AND a.attnum   = ad.adnum
        LEFT JOIN pg_type t ON a.atttypid = t.oid
        LEFT JOIN pg_namespace tn ON t.typnamespace = tn.oid
        LEFT JOIN pg_type elem_t ON t.typelem = elem_t.oid AND t.typelem != 0
        LEFT JOIN pg_namespace elem_tn ON elem_t.typnamespace = elem_tn.oid
        LEFT JOIN pg_description d ON d.objoid = a.attrelid AND d.objsubid = a.attnum
        LEFT JOIN (
          SELECT DISTINCT dep.objid AS type_oid, e.extname
          FROM pg_depend dep
          JOIN pg_extension e ON dep.refobjid = e.oid
          WHERE dep.deptype = 'e'
        ) ext_types ON ext_types.type_oid = COALESCE(NULLIF(t.typelem, 0::oid), t.oid)
        JOIN pg_class c
          ON a.attrelid = c.oid
        JOIN pg_namespace n
          ON c.relnamespace = n.oid
        WHERE a.attnum > 0
          AND NOT a.attisdropped
          AND c.relkind IN ('r', 'p')
          AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
        ORDER BY n.nspname, c.relname, a.attnum
        "#
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| ColumnRow {
            table_schema: r.table_schema,
            table_name: r.table_name,
            column_name: r.column_name,
            data_type: r.data_type,
            type_schema: r.type_schema,
            type_name: r.type_name,
            column_expr: r.column_expr,
            attgenerated: r.attgenerated,
            not_null: r.not_null,
            attndims: r.attndims,
            column_comment: r.column_comment,
            is_extension_type: r.is_extension_type,
            extension_name: r.extension_name,
            type_typtype: r.type_typtype,
            identity_sequence: r.identity_sequence,
        })
        .collect())
}

fn initialize_tables(
    all_tables: Vec<(String, String, String, Option<String>)>,
    parents: &std::collections::BTreeMap<(String, String), (String, String)>,
) -> (Vec<Table>, std::collections::BTreeMap<(String, String), usize>) {
    let mut tables = Vec::new();
    let mut table_index_map = std::collections::BTreeMap::new();

    for (idx, (schema, name, relkind, comment)) in all_tables.into_iter().enumerate() {
        table_index_map.insert((schema.clone(), name.clone()), idx);
        let table_deps = vec![DbObjectId::Schema {
            name: schema.clone(),
        }];
        let kind = TableKind::from_relkind(&relkind).unwrap_or(TableKind::Ordinary);
        let parent_table = parents.get(&(schema.clone(), name.clone())).cloned();
        tables.push(Table {
            schema: schema.clone(),
            name,
            kind,
            parent_table,
            columns: Vec::new(),
            primary_key: None,
            comment,
            table_dependencies: table_deps.clone(),
            all_dependencies: table_deps,
        });
    }

    (tables, table_index_map)
}

fn populate_columns(
    tables: &mut [Table],
    rows: Vec<ColumnRow>,
    table_index_map: &std::collections::BTreeMap<(String, String), usize>,
) {
    for ((schema, table), group) in &rows
        .into_iter()
        .chunk_by(|r| (r.table_schema.clone(), r.table_name.clone()))
    {
        let table_idx = match table_index_map.get(&(schema.clone(), table.clone())) {
            Some(&idx) => idx,
            None => continue,
        };

        let columns = group
            .map(|r| {
                let mut column_depends_on = Vec::new();
                let base_type_name = r.type_name.clone();

                if r.is_extension_type {
                    if let Some(ext_name) = &r.extension_name {
                        column_depends_on.push(DbObjectId::Extension {
                            name: ext_name.clone(),
                        });
                    }
                } else if let (Some(type_schema), Some(ref base_type_name)) =
                    (r.type_schema.clone(), base_type_name.clone())
                    && !is_system_schema(&type_schema)
                {
                    if r.type_typtype.as_deref() == Some("d") {
                        column_depends_on.push(DbObjectId::Domain {
                            schema: type_schema.clone(),
                            name: base_type_name.clone(),
                        });
                    } else {
                        column_depends_on.push(DbObjectId::Type {
                            schema: type_schema.clone(),
                            name: base_type_name.clone(),
                        });
                    }
                }

                Column {
                    name: r.column_name,
                    data_type: match (&r.type_schema, &base_type_name) {
                        (Some(type_schema), Some(base_type_name))
                            if !is_system_schema(type_schema) && !r.is_extension_type =>
                        {
                            format!(
                                "{}.{}{}",
                                quote_ident(type_schema),
                                quote_ident(base_type_name),
                                "[]".repeat(r.attndims as usize)
                            )
                        }
                        _ => r.data_type,
                    },
                    not_null: r.not_null,
                    generated: match r.attgenerated.as_deref() {
                        Some("s") => r.column_expr.clone(),
                        _ => None,
                    },
                    default: if r.attgenerated.as_deref() == Some("s") {
                        None
                    } else {
                        r.column_expr.clone()
                    },
                    identity_sequence: r.identity_sequence,
                    comment: r.column_comment,
                    depends_on: column_depends_on,
                }
            })
            .collect::<Vec<_>>();

        tables[table_idx].columns = columns;
        tables[table_idx].update_all_dependencies();
    }
}

async fn populate_primary_keys(
    tables: &mut [Table],
    table_index_map: &std::collections::BTreeMap<(String, String), usize>,
    conn: &mut PgConnection,
) -> Result<()> {
    let pk_constraints = sqlx::query!(
        r#"
        SELECT
            c.conname AS constraint_name,
            n.nspname AS schema_name,
            cl.relname AS table_name,
            array_agg(a.attname ORDER BY array_position(c.conkey, a.attnum)) AS pk_columns,
            d.description AS "constraint_comment?"
        FROM pg_constraint c
        JOIN pg_class cl ON c.conrelid = cl.oid
        JOIN pg_namespace n ON cl.relnamespace = n.oid
        JOIN pg_attribute a ON
            a.attrelid = c.conrelid AND
            a.attnum = ANY(c.conkey)
        LEFT JOIN pg_description d ON d.objoid = c.oid AND d.objsubid = 0
        WHERE
            c.contype = 'p' AND
            n.nspname NOT IN ('pg_catalog', 'information_schema')
        GROUP BY c.conname, n.nspname, cl.relname, d.description
        "#
    )
    .fetch_all(&mut *conn)
    .await?;

    for pk in pk_constraints {
        let table_idx = match table_index_map.get(&(pk.schema_name.clone(), pk.table_name.clone()))
        {
            Some(&idx) => idx,
            None => continue,
        };

        let pk_columns = match pk.pk_columns {
            Some(columns) => columns,
            None => continue,
        };

        tables[table_idx].primary_key = Some(PrimaryKey {
            name: pk.constraint_name,
            columns: pk_columns,
            comment: pk.constraint_comment,
        });
    }

    Ok(())
}

pub async fn fetch(conn: &mut PgConnection) -> Result<Vec<Table>> {
    info!("Fetching tables...");
    let all_tables = fetch_all_tables(&mut *conn).await?;
    let parents = fetch_partition_parents(&mut *conn).await?;
    info!("Fetching table columns...");
    let column_rows = fetch_table_columns(&mut *conn).await?;

    let (mut tables, table_index_map) = initialize_tables(all_tables, &parents);
    populate_columns(&mut tables, column_rows, &table_index_map);
    info!("Fetching primary keys...");
    populate_primary_keys(&mut tables, &table_index_map, &mut *conn).await?;

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_table(schema: &str, name: &str, kind: TableKind) -> Table {
        let mut table = Table {
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            parent_table: None,
            columns: vec![Column {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                default: None,
                not_null: true,
                generated: None,
                identity_sequence: None,
                comment: None,
                depends_on: vec![],
            }],
            primary_key: Some(PrimaryKey {
                name: format!("{name}_pkey"),
                columns: vec!["id".to_string()],
                comment: None,
            }),
            comment: None,
            table_dependencies: vec![DbObjectId::Schema {
                name: schema.to_string(),
            }],
            all_dependencies: vec![],
        };
        table.update_all_dependencies();
        table
    }

    #[test]
    fn test_qualified_name() {
        let table = make_test_table("app", "users", TableKind::Ordinary);
        assert_eq!(table.qualified_name(), "app.users");
    }

    #[test]
    fn test_is_partitioned() {
        let ordinary = make_test_table("public", "events", TableKind::Ordinary);
        let partitioned = make_test_table("public", "events_part", TableKind::Partitioned);
        assert!(!ordinary.is_partitioned());
        assert!(partitioned.is_partitioned());
    }

    #[test]
    fn test_depends_on_includes_schema_and_column_deps() {
        let mut table = make_test_table("app", "orders", TableKind::Ordinary);
        table.columns.push(Column {
            name: "status".to_string(),
            data_type: "app.order_status".to_string(),
            default: None,
            not_null: true,
            generated: None,
            identity_sequence: None,
            comment: None,
            depends_on: vec![DbObjectId::Type {
                schema: "app".to_string(),
                name: "order_status".to_string(),
            }],
        });
        table.update_all_dependencies();

        assert!(table.depends_on().contains(&DbObjectId::Schema {
            name: "app".to_string()
        }));
        assert!(table.depends_on().contains(&DbObjectId::Type {
            schema: "app".to_string(),
            name: "order_status".to_string()
        }));
    }
}
