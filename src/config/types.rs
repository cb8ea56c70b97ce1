use clap::Args;
use serde::{Deserialize, Serialize};

/// Raw configuration input - all fields Optional for merging (file ⊕ CLI).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub connection: Option<ConnectionInput>,
    pub scope: Option<ScopeInput>,
    pub policy: Option<PolicyInput>,
    pub mode: Option<ModeInput>,
    pub output: Option<OutputInput>,
    pub observability: Option<ObservabilityInput>,
}

/// Resolved configuration with all defaults applied.
#[derive(Debug, Clone)]
pub struct Config {
    pub connection: Connection,
    pub scope: Scope,
    pub policy: Policy,
    pub mode: Mode,
    pub output: Output,
    pub observability: Observability,
}

// ---------- Connection ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionInput {
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(alias = "database")]
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connection_uri: Option<String>,
    pub ssl_mode: Option<String>,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
    pub ssl_ca: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub host: Option<String>,
    pub port: u16,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connection_uri: Option<String>,
    pub ssl_mode: String,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
    pub ssl_ca: Option<String>,
}

// ---------- Scope ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScopeInput {
    pub schemas: Option<Vec<String>>,
    pub exclude_schemas: Option<Vec<String>>,
    pub exclude_tables: Option<Vec<String>>,
    pub exclude_columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub schemas: Vec<String>,
    pub exclude_schemas: Vec<String>,
    pub exclude_tables: Vec<String>,
    pub exclude_columns: Vec<String>,
}

// ---------- Policy ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PolicyInput {
    pub limit: Option<Vec<String>>,
    pub ordered: Option<bool>,
    pub ordered_desc: Option<bool>,
    pub random: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub limit_rules: Vec<String>,
    pub ordered: bool,
    pub ordered_desc: bool,
    pub random: bool,
}

// ---------- Mode ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModeInput {
    pub use_staging: Option<bool>,
    pub force: Option<bool>,
    pub keep: Option<bool>,
    pub data_only: Option<bool>,
    pub dry_run: Option<bool>,
    pub verify: Option<bool>,
    pub self_test: Option<bool>,
    pub target_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Mode {
    /// `None` means auto-select per 4.4.3's thresholds.
    pub use_staging: Option<bool>,
    pub force: bool,
    pub keep: bool,
    pub data_only: bool,
    pub dry_run: bool,
    pub verify: bool,
    pub self_test: bool,
    pub target_version: Option<String>,
}

// ---------- Output ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputInput {
    #[serde(alias = "output")]
    pub file: Option<String>,
    #[serde(alias = "gzip", alias = "compression")]
    pub compress: Option<bool>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub file: Option<String>,
    pub compress: bool,
    pub encoding: String,
}

// ---------- Observability ----------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObservabilityInput {
    pub verbose: Option<bool>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub audit_file: Option<String>,
    pub trace: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Observability {
    pub verbose: bool,
    pub log_level: String,
    pub log_file: Option<String>,
    pub audit_file: Option<String>,
    pub trace: bool,
}

// ---------- CLI argument groups, mirrored 1:1 onto *Input via From ----------

#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    #[arg(long, help = "Database host")]
    pub host: Option<String>,
    #[arg(long, help = "Database port")]
    pub port: Option<u16>,
    #[arg(long, help = "Database name")]
    pub dbname: Option<String>,
    #[arg(long, help = "Connection username")]
    pub username: Option<String>,
    #[arg(long, help = "Connection password")]
    pub password: Option<String>,
    #[arg(long, help = "Full postgresql:// connection URI")]
    pub connection_uri: Option<String>,
    #[arg(long, help = "SSL mode: disable, allow, prefer, require, verify-ca, verify-full")]
    pub ssl_mode: Option<String>,
    #[arg(long, help = "Client SSL certificate path")]
    pub ssl_cert: Option<String>,
    #[arg(long, help = "Client SSL key path")]
    pub ssl_key: Option<String>,
    #[arg(long, help = "SSL CA certificate path")]
    pub ssl_ca: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    #[arg(long, help = "Only sample these schemas (glob, repeatable)")]
    pub schema: Option<Vec<String>>,
    #[arg(long, help = "Exclude these schemas (glob, repeatable)")]
    pub exclude_schema: Option<Vec<String>>,
    #[arg(long, help = "Exclude these tables (glob, repeatable)")]
    pub exclude_table: Option<Vec<String>>,
    #[arg(long, help = "Exclude these columns (glob, repeatable)")]
    pub exclude_column: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PolicyArgs {
    #[arg(long, help = "PATTERN=VALUE sampling rule (repeatable)")]
    pub limit: Option<Vec<String>>,
    #[arg(long, help = "Order samples by primary key")]
    pub ordered: bool,
    #[arg(long, help = "Order ascending (default for --ordered is descending)")]
    pub ordered_asc: bool,
    #[arg(long, help = "Order descending")]
    pub ordered_desc: bool,
    #[arg(long, help = "Order samples randomly")]
    pub random: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ModeArgs {
    #[arg(long, help = "Force staging-schema sampling mode")]
    pub use_staging: bool,
    #[arg(long, help = "Force direct (in-memory) sampling mode")]
    pub no_staging: bool,
    #[arg(long, help = "Drop an existing staging schema before use")]
    pub force: bool,
    #[arg(long, help = "Preserve the staging schema after completion")]
    pub keep: bool,
    #[arg(long, help = "Skip schema DDL, emit data only")]
    pub data_only: bool,
    #[arg(long, help = "Estimate only, write nothing")]
    pub dry_run: bool,
    #[arg(long, help = "Verify referential integrity before writing output")]
    pub verify: bool,
    #[arg(long, help = "Run the self-test harness after generating output")]
    pub self_test: bool,
    #[arg(long, help = "Target PostgreSQL version for emitted syntax")]
    pub target_version: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    #[arg(long, short = 'f', help = "Output file (default: stdout)")]
    pub file: Option<String>,
    #[arg(long, alias = "gzip", help = "Gzip-compress the output")]
    pub compress: bool,
    #[arg(long, help = "Output character encoding")]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ObservabilityArgs {
    #[arg(long, short = 'v', help = "Verbose logging")]
    pub verbose: bool,
    #[arg(long, help = "Explicit log level (error, warn, info, debug, trace)")]
    pub log_level: Option<String>,
    #[arg(long, help = "Also write logs to this file")]
    pub log_file: Option<String>,
    #[arg(long, help = "Write a JSON audit report to this path")]
    pub audit_file: Option<String>,
    #[arg(long, help = "Enable trace-level diagnostics")]
    pub trace: bool,
}

impl From<ConnectionArgs> for ConnectionInput {
    fn from(a: ConnectionArgs) -> Self {
        Self {
            host: a.host,
            port: a.port,
            dbname: a.dbname,
            username: a.username,
            password: a.password,
            connection_uri: a.connection_uri,
            ssl_mode: a.ssl_mode,
            ssl_cert: a.ssl_cert,
            ssl_key: a.ssl_key,
            ssl_ca: a.ssl_ca,
        }
    }
}

impl From<ScopeArgs> for ScopeInput {
    fn from(a: ScopeArgs) -> Self {
        Self {
            schemas: a.schema,
            exclude_schemas: a.exclude_schema,
            exclude_tables: a.exclude_table,
            exclude_columns: a.exclude_column,
        }
    }
}

impl From<PolicyArgs> for PolicyInput {
    fn from(a: PolicyArgs) -> Self {
        Self {
            limit: a.limit,
            ordered: if a.ordered || a.ordered_asc || a.ordered_desc {
                Some(true)
            } else {
                None
            },
            ordered_desc: if a.ordered_asc {
                Some(false)
            } else if a.ordered_desc {
                Some(true)
            } else {
                None
            },
            random: if a.random { Some(true) } else { None },
        }
    }
}

impl From<ModeArgs> for ModeInput {
    fn from(a: ModeArgs) -> Self {
        Self {
            use_staging: if a.no_staging {
                Some(false)
            } else if a.use_staging {
                Some(true)
            } else {
                None
            },
            force: if a.force { Some(true) } else { None },
            keep: if a.keep { Some(true) } else { None },
            data_only: if a.data_only { Some(true) } else { None },
            dry_run: if a.dry_run { Some(true) } else { None },
            verify: if a.verify { Some(true) } else { None },
            self_test: if a.self_test { Some(true) } else { None },
            target_version: a.target_version,
        }
    }
}

impl From<OutputArgs> for OutputInput {
    fn from(a: OutputArgs) -> Self {
        Self {
            file: a.file,
            compress: if a.compress { Some(true) } else { None },
            encoding: a.encoding,
        }
    }
}

impl From<ObservabilityArgs> for ObservabilityInput {
    fn from(a: ObservabilityArgs) -> Self {
        Self {
            verbose: if a.verbose { Some(true) } else { None },
            log_level: a.log_level,
            log_file: a.log_file,
            audit_file: a.audit_file,
            trace: if a.trace { Some(true) } else { None },
        }
    }
}
