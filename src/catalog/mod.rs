//! Catalog Reader: loads the set of database objects relevant to a dump —
//! schemas, tables, constraints, indexes, triggers, sequences, views, custom
//! types, domains, extensions — along with their dependency edges, from
//! `pg_catalog`/`information_schema`.
use crate::config::filter::ObjectFilter;
use id::{DbObjectId, DependsOn};
use sqlx::PgPool;
use std::collections::BTreeMap;

pub mod comments;
pub mod constraint;
pub mod custom_type;
pub mod domain;
pub mod extension;
pub mod id;
pub mod index;
pub mod schema;
pub mod sequence;
pub mod table;
pub mod triggers;
pub mod utils;
pub mod view;

#[derive(Debug, Clone)]
pub struct Catalog {
    pub schemas: Vec<schema::Schema>,
    pub tables: Vec<table::Table>,
    pub views: Vec<view::View>,
    pub types: Vec<custom_type::CustomType>,
    pub domains: Vec<domain::Domain>,
    pub sequences: Vec<sequence::Sequence>,
    pub indexes: Vec<index::Index>,
    pub constraints: Vec<constraint::Constraint>,
    pub triggers: Vec<triggers::Trigger>,
    pub extensions: Vec<extension::Extension>,

    pub forward_deps: BTreeMap<DbObjectId, Vec<DbObjectId>>,
    pub reverse_deps: BTreeMap<DbObjectId, Vec<DbObjectId>>,
}

impl Catalog {
    /// Load the full catalog, then drop tables (and table-scoped objects)
    /// outside `filter`'s scope before sampling ever looks at them.
    pub async fn discover(pool: &PgPool, filter: &ObjectFilter) -> anyhow::Result<Self> {
        let mut conn = pool.acquire().await?;

        let schemas = schema::fetch(pool).await?;
        let mut tables = table::fetch(&mut conn).await?;
        let views = view::fetch(pool).await?;
        let types = custom_type::fetch(pool).await?;
        let domains = domain::fetch(&mut conn).await?;
        let sequences = sequence::fetch(&mut conn).await?;
        let indexes = index::fetch(pool).await?;
        let constraints = constraint::fetch(&mut conn).await?;
        let triggers = triggers::fetch(pool).await?;
        let extensions = extension::fetch(&mut conn).await?;
        drop(conn);

        tables.retain(|t| filter.should_include_table(&t.schema, &t.name));
        let kept: std::collections::HashSet<(String, String)> = tables
            .iter()
            .map(|t| (t.schema.clone(), t.name.clone()))
            .collect();
        let constraints: Vec<_> = constraints
            .into_iter()
            .filter(|c| kept.contains(&(c.schema.clone(), c.table.clone())))
            .collect();
        let indexes: Vec<_> = indexes
            .into_iter()
            .filter(|i| kept.contains(&(i.table_schema.clone(), i.table_name.clone())))
            .collect();
        let triggers: Vec<_> = triggers
            .into_iter()
            .filter(|t| kept.contains(&(t.schema.clone(), t.table_name.clone())))
            .collect();

        let mut forward_deps = BTreeMap::new();
        let mut reverse_deps = BTreeMap::new();

        insert_deps(&tables, &mut forward_deps, &mut reverse_deps);
        insert_deps(&views, &mut forward_deps, &mut reverse_deps);
        insert_deps(&types, &mut forward_deps, &mut reverse_deps);
        insert_deps(&domains, &mut forward_deps, &mut reverse_deps);
        insert_deps(&sequences, &mut forward_deps, &mut reverse_deps);
        insert_deps(&indexes, &mut forward_deps, &mut reverse_deps);
        insert_deps(&constraints, &mut forward_deps, &mut reverse_deps);
        insert_deps(&triggers, &mut forward_deps, &mut reverse_deps);
        insert_deps(&extensions, &mut forward_deps, &mut reverse_deps);

        Ok(Self {
            schemas,
            tables,
            views,
            types,
            domains,
            sequences,
            indexes,
            constraints,
            triggers,
            extensions,
            forward_deps,
            reverse_deps,
        })
    }

    pub fn find_table(&self, schema: &str, name: &str) -> Option<&table::Table> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }

    pub fn find_view(&self, schema: &str, name: &str) -> Option<&view::View> {
        self.views
            .iter()
            .find(|v| v.schema == schema && v.name == name)
    }

    /// Foreign keys declared on `table`, used to walk the referential closure.
    pub fn foreign_keys_for(&self, schema: &str, table: &str) -> Vec<&constraint::Constraint> {
        self.constraints
            .iter()
            .filter(|c| {
                c.schema == schema
                    && c.table == table
                    && matches!(c.constraint_type, constraint::ConstraintType::ForeignKey { .. })
            })
            .collect()
    }
}

fn insert_deps<T: DependsOn>(
    items: &[T],
    forward: &mut BTreeMap<DbObjectId, Vec<DbObjectId>>,
    reverse: &mut BTreeMap<DbObjectId, Vec<DbObjectId>>,
) {
    for item in items {
        let id = item.id();
        let deps = item.depends_on();
        forward.insert(id.clone(), deps.to_vec());
        for dep in deps {
            reverse.entry(dep.clone()).or_default().push(id.clone());
        }
    }
}
