//! Top-level orchestration (A: connect → discover → graph → rules → sample
//! → verify → render → write). `main.rs` parses the CLI into a `Config` and
//! hands it here.
use crate::catalog::Catalog;
use crate::config::filter::ObjectFilter;
use crate::config::types::Config;
use crate::db::connection::{build_connection_uri, connect_with_retry};
use crate::errors::DbSampleError;
use crate::graph::DependencyGraph;
use crate::rules::RuleSet;
use crate::sampling::SamplingEngine;
use crate::staging::StagingManager;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use tracing::info;

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let uri = build_connection_uri(&config.connection)?;
    let pool = connect_with_retry(&uri).await?;

    let filter = ObjectFilter::new(&config.scope);
    info!("discovering catalog");
    let catalog = Catalog::discover(&pool, &filter).await?;
    info!(tables = catalog.tables.len(), "catalog discovered");

    let graph = DependencyGraph::build(&catalog);
    if graph.has_cycles() {
        info!(groups = graph.cycle_groups().len(), "dependency graph has cycles; insertion order breaks ties lexicographically");
    }

    let rules = RuleSet::parse(&config.policy.limit_rules)?;
    let qualified: Vec<(String, String)> = catalog
        .tables
        .iter()
        .map(|t| (t.schema.clone(), t.name.clone()))
        .collect();
    rules.warn_unmatched(&qualified);

    if config.mode.dry_run {
        info!("dry run: skipping sampling and output");
        return Ok(());
    }

    let max_fks = catalog
        .tables
        .iter()
        .map(|t| catalog.foreign_keys_for(&t.schema, &t.name).len())
        .max()
        .unwrap_or(0);
    let want_staging = config
        .mode
        .use_staging
        .unwrap_or_else(|| crate::staging::should_auto_enable(catalog.tables.len(), max_fks));

    let engine = SamplingEngine::new(&pool, &catalog, &filter, &rules, config);
    let mut staging = StagingManager::new(&pool);
    let result = if want_staging {
        if staging.create(config.mode.force).await? {
            info!(schema = staging.schema_name(), "sampling via staging schema");
            let staged = engine.sample_all_staged(&staging).await;
            if !config.mode.keep {
                staging.drop().await.ok();
            }
            staged?
        } else {
            engine.sample_all().await?
        }
    } else {
        engine.sample_all().await?
    };
    let total_rows: usize = result.tables.values().map(|t| t.rows.len()).sum();
    info!(tables = result.tables.len(), rows = total_rows, "sampling complete");

    let verification = if config.mode.verify {
        let report = crate::verify::verify(&catalog, &result);
        if !report.ok() {
            for violation in &report.violations {
                tracing::warn!(
                    constraint = %violation.constraint_name,
                    table = %violation.table.qualified(),
                    referenced_table = %violation.referenced_table.qualified(),
                    count = violation.count,
                    "referential integrity violation"
                );
            }
            return Err(DbSampleError::Integrity(format!(
                "{} referential integrity violation(s) found",
                report.violations.len()
            ))
            .into());
        }
        Some(report)
    } else {
        None
    };

    // `--self-test` replays the dump against a scratch database afterward, so
    // the full text has to exist in memory regardless; every other path
    // writes straight to the output sink as it renders; chunking, so peak
    // memory for that path is the largest single-table chunk (`render::data`),
    // not the whole rendered dump.
    if config.mode.self_test {
        let mut buffer = Vec::new();
        crate::render::render_dump(&mut buffer, &catalog, &graph, &result, config)?;
        write_output(config, &buffer)?;

        let sql = String::from_utf8_lossy(&buffer).into_owned();
        let report = crate::self_test::run(&config.connection, &sql).await?;
        if !report.passed() {
            return Err(DbSampleError::Integrity(format!(
                "self-test failed: {:?}",
                report.errors
            ))
            .into());
        }
    } else {
        write_streamed(config, &catalog, &graph, &result)?;
    }

    if let Some(audit_path) = &config.observability.audit_file {
        let generated_at = chrono::Utc::now().to_rfc3339();
        let report = crate::audit::AuditReport::build(
            generated_at,
            config.connection.dbname.clone(),
            &result,
            verification.as_ref(),
        );
        report.write_to(std::path::Path::new(audit_path))?;
    }

    Ok(())
}

/// Render directly into the output sink (optionally through a gzip encoder),
/// without ever holding the full dump in memory at once.
fn write_streamed(
    config: &Config,
    catalog: &Catalog,
    graph: &DependencyGraph,
    result: &crate::sampling::SamplingResult,
) -> anyhow::Result<()> {
    match &config.output.file {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|e| {
                DbSampleError::Io(format!("could not open output file {path}: {e}"))
            })?;
            if config.output.compress {
                let mut encoder = GzEncoder::new(file, Compression::default());
                crate::render::render_dump(&mut encoder, catalog, graph, result, config)?;
                encoder.finish().map_err(|e| {
                    DbSampleError::Io(format!("could not flush compressed output: {e}"))
                })?;
            } else {
                let mut file = file;
                crate::render::render_dump(&mut file, catalog, graph, result, config)?;
            }
            restrict_permissions(path)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            if config.output.compress {
                let mut encoder = GzEncoder::new(&mut lock, Compression::default());
                crate::render::render_dump(&mut encoder, catalog, graph, result, config)?;
                encoder.finish().map_err(|e| {
                    DbSampleError::Io(format!("could not flush compressed output: {e}"))
                })?;
            } else {
                crate::render::render_dump(&mut lock, catalog, graph, result, config)?;
            }
        }
    }
    Ok(())
}

/// Used only for the `--self-test` path, which already needs the whole
/// rendered dump as one in-memory string to hand to the replay connection.
fn write_output(config: &Config, buffer: &[u8]) -> anyhow::Result<()> {
    let encoded = if config.output.compress {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(buffer)?;
        encoder.finish()?
    } else {
        buffer.to_vec()
    };

    match &config.output.file {
        Some(path) => {
            std::fs::write(path, &encoded)
                .map_err(|e| DbSampleError::Io(format!("could not write output file {path}: {e}")))?;
            restrict_permissions(path)?;
        }
        None => {
            std::io::stdout().write_all(&encoded)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &str) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &str) -> anyhow::Result<()> {
    Ok(())
}
