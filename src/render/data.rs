//! Data section (§4.6 section 4): one grouped multi-row INSERT per table, in
//! insertion order, with dialect-safe identifier quoting. Rows are chunked
//! rather than emitted as a single statement so large tables don't force the
//! whole section into memory at once.
use crate::catalog::Catalog;
use crate::graph::TableRef;
use crate::render::value::render_literal;
use crate::render::quote_ident;
use crate::sampling::SamplingResult;
use std::io::Write;

/// Rows per INSERT statement; keeps any single statement bounded regardless
/// of how large a table's sample turns out to be.
const INSERT_CHUNK_SIZE: usize = 500;

pub fn render_data(
    sink: &mut dyn Write,
    catalog: &Catalog,
    result: &SamplingResult,
    insertion_order: &[TableRef],
) -> anyhow::Result<()> {
    for tref in insertion_order {
        let Some(sample) = result.get(tref) else {
            continue;
        };
        if sample.rows.is_empty() {
            continue;
        }
        if catalog.find_table(&tref.schema, &tref.name).is_none() {
            continue;
        }

        let qualified = format!("{}.{}", quote_ident(&tref.schema), quote_ident(&tref.name));
        let columns = sample
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        for chunk in sample.rows.chunks(INSERT_CHUNK_SIZE) {
            write!(sink, "INSERT INTO {qualified} ({columns}) VALUES ")?;
            for (i, row) in chunk.iter().enumerate() {
                if i > 0 {
                    write!(sink, ", ")?;
                }
                let values = row
                    .iter()
                    .map(render_literal)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(sink, "({values})")?;
            }
            writeln!(sink, ";")?;
        }
    }
    writeln!(sink)?;
    Ok(())
}
