use super::*;
use crate::config::merge::Merge;
use crate::config::types::*;

#[test]
fn test_config_input_merge_cli_overrides_file() {
    let file_config = ConfigInput {
        connection: Some(ConnectionInput {
            host: Some("filehost".to_string()),
            dbname: Some("filedb".to_string()),
            ..Default::default()
        }),
        policy: Some(PolicyInput {
            limit: Some(vec!["t=5".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let cli_config = ConfigInput {
        connection: Some(ConnectionInput {
            host: None, // CLI doesn't override this
            dbname: Some("clidb".to_string()),
            ..Default::default()
        }),
        policy: Some(PolicyInput {
            limit: Some(vec!["t=20".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let merged = file_config.merge(cli_config);

    // file-only field survives
    assert_eq!(
        merged.connection.as_ref().unwrap().host,
        Some("filehost".to_string())
    );
    // CLI wins where both set
    assert_eq!(
        merged.connection.as_ref().unwrap().dbname,
        Some("clidb".to_string())
    );
    assert_eq!(
        merged.policy.as_ref().unwrap().limit,
        Some(vec!["t=20".to_string()])
    );
}

#[test]
fn test_resolve_applies_defaults() {
    let config = ConfigBuilder::new().resolve().unwrap();
    assert_eq!(config.connection.port, defaults::DEFAULT_PORT);
    assert_eq!(config.connection.ssl_mode, defaults::DEFAULT_SSL_MODE);
    assert_eq!(config.output.encoding, defaults::DEFAULT_ENCODING);
    assert!(!config.policy.ordered);
    assert!(!config.mode.dry_run);
}

#[test]
fn test_resolve_rejects_ordered_and_random_together() {
    let input = ConfigInput {
        policy: Some(PolicyInput {
            ordered: Some(true),
            random: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };
    let result = ConfigBuilder::new().with_cli_args(input).resolve();
    assert!(result.is_err());
}

#[test]
fn test_alias_database_maps_to_dbname() {
    let yaml = "connection:\n  database: aliased_db\n";
    let input: ConfigInput = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        input.connection.unwrap().dbname,
        Some("aliased_db".to_string())
    );
}

#[test]
fn test_alias_output_and_gzip_map_through() {
    let yaml = "output:\n  output: dump.sql\n  gzip: true\n";
    let input: ConfigInput = serde_yaml::from_str(yaml).unwrap();
    let output = input.output.unwrap();
    assert_eq!(output.file, Some("dump.sql".to_string()));
    assert_eq!(output.compress, Some(true));
}

#[test]
fn test_cli_args_round_trip_into_config_input() {
    let scope_args = ScopeArgs {
        schema: Some(vec!["public".to_string()]),
        exclude_table: Some(vec!["secrets".to_string()]),
        ..Default::default()
    };
    let input: ScopeInput = scope_args.into();
    assert_eq!(input.schemas, Some(vec!["public".to_string()]));
    assert_eq!(input.exclude_tables, Some(vec!["secrets".to_string()]));
}

#[test]
fn test_ordered_desc_flag_sets_direction() {
    let policy_args = PolicyArgs {
        ordered_asc: true,
        ..Default::default()
    };
    let input: PolicyInput = policy_args.into();
    assert_eq!(input.ordered, Some(true));
    assert_eq!(input.ordered_desc, Some(false));
}
