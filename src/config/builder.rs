use crate::config::defaults;
use crate::config::{merge::Merge, types::*};
use crate::errors::DbSampleError;
use anyhow::Result;

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        Ok(Config {
            connection: self.resolve_connection()?,
            scope: self.resolve_scope(),
            policy: self.resolve_policy()?,
            mode: self.resolve_mode()?,
            output: self.resolve_output(),
            observability: self.resolve_observability(),
        })
    }

    fn resolve_connection(&self) -> Result<Connection> {
        let c = self.config_input.connection.as_ref();

        Ok(Connection {
            host: c.and_then(|c| c.host.clone()),
            port: c.and_then(|c| c.port).unwrap_or(defaults::DEFAULT_PORT),
            dbname: c.and_then(|c| c.dbname.clone()),
            username: c.and_then(|c| c.username.clone()),
            password: c.and_then(|c| c.password.clone()),
            connection_uri: c.and_then(|c| c.connection_uri.clone()),
            ssl_mode: c
                .and_then(|c| c.ssl_mode.clone())
                .unwrap_or_else(|| defaults::DEFAULT_SSL_MODE.to_string()),
            ssl_cert: c.and_then(|c| c.ssl_cert.clone()),
            ssl_key: c.and_then(|c| c.ssl_key.clone()),
            ssl_ca: c.and_then(|c| c.ssl_ca.clone()),
        })
    }

    fn resolve_scope(&self) -> Scope {
        let s = self.config_input.scope.as_ref();
        Scope {
            schemas: s.and_then(|s| s.schemas.clone()).unwrap_or_default(),
            exclude_schemas: s
                .and_then(|s| s.exclude_schemas.clone())
                .unwrap_or_default(),
            exclude_tables: s.and_then(|s| s.exclude_tables.clone()).unwrap_or_default(),
            exclude_columns: s
                .and_then(|s| s.exclude_columns.clone())
                .unwrap_or_default(),
        }
    }

    fn resolve_policy(&self) -> Result<Policy> {
        let p = self.config_input.policy.as_ref();
        let ordered = p.and_then(|p| p.ordered).unwrap_or(false);
        let random = p.and_then(|p| p.random).unwrap_or(false);
        if ordered && random {
            return Err(DbSampleError::Configuration(
                "--ordered and --random are mutually exclusive".into(),
            )
            .into());
        }
        Ok(Policy {
            limit_rules: p.and_then(|p| p.limit.clone()).unwrap_or_default(),
            ordered,
            // Default direction is descending per 4.4.1.
            ordered_desc: p.and_then(|p| p.ordered_desc).unwrap_or(true),
            random,
        })
    }

    fn resolve_mode(&self) -> Result<Mode> {
        let m = self.config_input.mode.as_ref();
        let keep = m.and_then(|m| m.keep).unwrap_or(false);
        let dry_run = m.and_then(|m| m.dry_run).unwrap_or(false);
        Ok(Mode {
            use_staging: m.and_then(|m| m.use_staging),
            force: m.and_then(|m| m.force).unwrap_or(false),
            keep,
            data_only: m.and_then(|m| m.data_only).unwrap_or(false),
            dry_run,
            verify: m.and_then(|m| m.verify).unwrap_or(false),
            self_test: m.and_then(|m| m.self_test).unwrap_or(false),
            target_version: m.and_then(|m| m.target_version.clone()),
        })
    }

    fn resolve_output(&self) -> Output {
        let o = self.config_input.output.as_ref();
        Output {
            file: o.and_then(|o| o.file.clone()),
            compress: o.and_then(|o| o.compress).unwrap_or(false),
            encoding: o
                .and_then(|o| o.encoding.clone())
                .unwrap_or_else(|| defaults::DEFAULT_ENCODING.to_string()),
        }
    }

    fn resolve_observability(&self) -> Observability {
        let o = self.config_input.observability.as_ref();
        Observability {
            verbose: o.and_then(|o| o.verbose).unwrap_or(false),
            log_level: o
                .and_then(|o| o.log_level.clone())
                .unwrap_or_else(|| defaults::DEFAULT_LOG_LEVEL.to_string()),
            log_file: o.and_then(|o| o.log_file.clone()),
            audit_file: o.and_then(|o| o.audit_file.clone()),
            trace: o.and_then(|o| o.trace).unwrap_or(false),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_override_file_values() {
        let file = ConfigInput {
            connection: Some(ConnectionInput {
                dbname: Some("file-db".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cli = ConfigInput {
            connection: Some(ConnectionInput {
                dbname: Some("cli-db".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = ConfigBuilder::new()
            .with_file(file)
            .with_cli_args(cli)
            .resolve()
            .unwrap();
        assert_eq!(config.connection.dbname, Some("cli-db".to_string()));
    }

    #[test]
    fn test_resolve_fills_in_defaults_for_unset_fields() {
        let config = ConfigBuilder::new().resolve().unwrap();
        assert_eq!(config.connection.port, defaults::DEFAULT_PORT);
        assert_eq!(config.connection.ssl_mode, defaults::DEFAULT_SSL_MODE);
        assert_eq!(config.output.encoding, defaults::DEFAULT_ENCODING);
        assert!(!config.mode.keep);
    }

    #[test]
    fn test_ordered_and_random_both_set_is_configuration_error() {
        let cli = ConfigInput {
            policy: Some(PolicyInput {
                ordered: Some(true),
                random: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = ConfigBuilder::new().with_cli_args(cli).resolve().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
