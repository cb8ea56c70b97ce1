//! Output Generator (C6): renders a discovered, sampled catalog to a single
//! SQL script — schema objects, then data, then constraints/indexes, then
//! sequence resets.
pub mod data;
pub mod ddl;
pub mod header;
pub mod sql;
pub mod value;

use crate::catalog::Catalog;
use crate::config::types::Config;
use crate::graph::DependencyGraph;
use crate::sampling::SamplingResult;
use std::io::Write;

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render the full dump to `sink`, in the section order fixed by §4.6:
/// header, session setup, schema objects (unless data-only), data, then
/// constraints/indexes in reverse insertion order, sequence resets, teardown.
pub fn render_dump(
    sink: &mut dyn Write,
    catalog: &Catalog,
    graph: &DependencyGraph,
    result: &SamplingResult,
    config: &Config,
) -> anyhow::Result<()> {
    header::render_header(sink, catalog, config)?;

    writeln!(sink, "SET session_replication_role = 'replica';")?;
    writeln!(sink, "SET client_min_messages = warning;")?;
    writeln!(sink)?;

    let insertion_order = graph.insertion_order();

    if !config.mode.data_only {
        ddl::render_schema_objects(
            sink,
            catalog,
            &insertion_order,
            config.mode.target_version.as_deref(),
        )?;
    }

    data::render_data(sink, catalog, result, &insertion_order)?;

    if !config.mode.data_only {
        ddl::render_constraints_and_indexes(sink, catalog, &insertion_order)?;
        ddl::render_sequence_resets(sink, catalog, result)?;
    }

    writeln!(sink)?;
    writeln!(sink, "SET session_replication_role = 'origin';")?;

    Ok(())
}
