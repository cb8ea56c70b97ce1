//! Audit File Writer (A6): a JSON report of what a run sampled, written
//! alongside the SQL dump when `--audit-file` is given.
use crate::errors::DbSampleError;
use crate::sampling::SamplingResult;
use crate::verify::VerificationReport;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct TableAudit {
    pub schema: String,
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub generated_at: String,
    pub dbname: Option<String>,
    pub tables_sampled: usize,
    pub total_rows: usize,
    pub tables: Vec<TableAudit>,
    pub verification_violations: usize,
}

impl AuditReport {
    pub fn build(
        generated_at: String,
        dbname: Option<String>,
        result: &SamplingResult,
        verification: Option<&VerificationReport>,
    ) -> Self {
        let mut tables: Vec<TableAudit> = result
            .tables
            .iter()
            .map(|(tref, sample)| TableAudit {
                schema: tref.schema.clone(),
                table: tref.name.clone(),
                rows: sample.rows.len(),
            })
            .collect();
        tables.sort_by(|a, b| (&a.schema, &a.table).cmp(&(&b.schema, &b.table)));

        let total_rows = tables.iter().map(|t| t.rows).sum();

        Self {
            generated_at,
            dbname,
            tables_sampled: tables.len(),
            total_rows,
            tables,
            verification_violations: verification.map(|v| v.violations.len()).unwrap_or(0),
        }
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DbSampleError::Internal(format!("could not serialize audit report: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| DbSampleError::Io(format!("could not write audit file {}: {e}", path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TableRef;
    use crate::sampling::TableSample;

    #[test]
    fn test_build_sums_rows_across_tables() {
        let mut result = SamplingResult::default();
        result.tables.insert(
            TableRef::new("public", "a"),
            TableSample {
                columns: vec![],
                rows: vec![vec![], vec![]],
            },
        );
        result.tables.insert(
            TableRef::new("public", "b"),
            TableSample {
                columns: vec![],
                rows: vec![vec![]],
            },
        );

        let report = AuditReport::build(
            "2026-07-28T00:00:00Z".to_string(),
            Some("appdb".to_string()),
            &result,
            None,
        );
        assert_eq!(report.tables_sampled, 2);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.verification_violations, 0);
    }
}
