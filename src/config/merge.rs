use crate::config::types::*;

/// Trait for merging optional configuration values. `other` always wins,
/// matching CLI-over-file precedence (§6 Input configuration).
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            connection: match (self.connection, other.connection) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            scope: match (self.scope, other.scope) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            policy: match (self.policy, other.policy) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            mode: match (self.mode, other.mode) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            output: match (self.output, other.output) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            observability: match (self.observability, other.observability) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
        }
    }
}

impl ConnectionInput {
    pub fn merge_with(self, other: ConnectionInput) -> ConnectionInput {
        ConnectionInput {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            dbname: other.dbname.or(self.dbname),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            connection_uri: other.connection_uri.or(self.connection_uri),
            ssl_mode: other.ssl_mode.or(self.ssl_mode),
            ssl_cert: other.ssl_cert.or(self.ssl_cert),
            ssl_key: other.ssl_key.or(self.ssl_key),
            ssl_ca: other.ssl_ca.or(self.ssl_ca),
        }
    }
}

impl ScopeInput {
    pub fn merge_with(self, other: ScopeInput) -> ScopeInput {
        ScopeInput {
            schemas: other.schemas.or(self.schemas),
            exclude_schemas: other.exclude_schemas.or(self.exclude_schemas),
            exclude_tables: other.exclude_tables.or(self.exclude_tables),
            exclude_columns: other.exclude_columns.or(self.exclude_columns),
        }
    }
}

impl PolicyInput {
    pub fn merge_with(self, other: PolicyInput) -> PolicyInput {
        PolicyInput {
            limit: other.limit.or(self.limit),
            ordered: other.ordered.or(self.ordered),
            ordered_desc: other.ordered_desc.or(self.ordered_desc),
            random: other.random.or(self.random),
        }
    }
}

impl ModeInput {
    pub fn merge_with(self, other: ModeInput) -> ModeInput {
        ModeInput {
            use_staging: other.use_staging.or(self.use_staging),
            force: other.force.or(self.force),
            keep: other.keep.or(self.keep),
            data_only: other.data_only.or(self.data_only),
            dry_run: other.dry_run.or(self.dry_run),
            verify: other.verify.or(self.verify),
            self_test: other.self_test.or(self.self_test),
            target_version: other.target_version.or(self.target_version),
        }
    }
}

impl OutputInput {
    pub fn merge_with(self, other: OutputInput) -> OutputInput {
        OutputInput {
            file: other.file.or(self.file),
            compress: other.compress.or(self.compress),
            encoding: other.encoding.or(self.encoding),
        }
    }
}

impl ObservabilityInput {
    pub fn merge_with(self, other: ObservabilityInput) -> ObservabilityInput {
        ObservabilityInput {
            verbose: other.verbose.or(self.verbose),
            log_level: other.log_level.or(self.log_level),
            log_file: other.log_file.or(self.log_file),
            audit_file: other.audit_file.or(self.audit_file),
            trace: other.trace.or(self.trace),
        }
    }
}
