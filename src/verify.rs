//! Integrity Verifier (C5): post-sampling check that every sampled foreign
//! key's non-null tuples resolve to a row on the referenced side, reusing
//! the same V/P set-difference shape as `sampling`'s FK closure.
use crate::catalog::Catalog;
use crate::catalog::constraint::ConstraintType;
use crate::graph::TableRef;
use crate::render::value::SqlValue;
use crate::sampling::SamplingResult;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint_name: String,
    pub table: TableRef,
    pub local_columns: Vec<String>,
    pub referenced_table: TableRef,
    pub referenced_columns: Vec<String>,
    pub count: usize,
    pub sample_tuples: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn verify(catalog: &Catalog, result: &SamplingResult) -> VerificationReport {
    let mut violations = Vec::new();

    for table in &catalog.tables {
        let a_ref = TableRef::new(table.schema.clone(), table.name.clone());
        let Some(a_sample) = result.get(&a_ref) else {
            continue;
        };

        for fk in catalog.foreign_keys_for(&table.schema, &table.name) {
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
            let Some(b_table) = catalog.find_table(referenced_schema, referenced_table) else {
                continue;
            };
            let Some(pk) = &b_table.primary_key else {
                continue;
            };
            let Some(b_sample) = result.get(&b_ref) else {
                continue;
            };

            let local_indices: Vec<usize> = local_cols
                .iter()
                .filter_map(|c| a_sample.columns.iter().position(|n| n == c))
                .collect();
            if local_indices.len() != local_cols.len() {
                continue;
            }
            let ref_indices: Vec<usize> = pk
                .columns
                .iter()
                .filter_map(|c| b_sample.columns.iter().position(|n| n == c))
                .collect();
            if ref_indices.len() != pk.columns.len() {
                continue;
            }

            let p: BTreeSet<Vec<String>> = b_sample
                .rows
                .iter()
                .filter_map(|row| tuple_of(row, &ref_indices))
                .collect();

            let mut missing: Vec<Vec<String>> = Vec::new();
            for row in &a_sample.rows {
                if let Some(tuple) = tuple_of(row, &local_indices)
                    && !p.contains(&tuple)
                {
                    missing.push(tuple);
                }
            }

            if !missing.is_empty() {
                let sample_tuples = missing
                    .iter()
                    .take(crate::constants::MAX_REPORTED_VIOLATIONS)
                    .cloned()
                    .collect();
                violations.push(Violation {
                    constraint_name: fk.name.clone(),
                    table: a_ref.clone(),
                    local_columns: local_cols.clone(),
                    referenced_table: b_ref.clone(),
                    referenced_columns: ref_cols.clone(),
                    count: missing.len(),
                    sample_tuples,
                });
            }
        }
    }

    VerificationReport { violations }
}

fn tuple_of(row: &[SqlValue], indices: &[usize]) -> Option<Vec<String>> {
    let mut out = Vec::with_capacity(indices.len());
    for &i in indices {
        match row.get(i).and_then(SqlValue::as_comparable) {
            Some(v) => out.push(v),
            None => return None,
        }
    }
    Some(out)
}
