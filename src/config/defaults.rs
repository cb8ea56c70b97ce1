use crate::constants::DEFAULT_STAGING_SCHEMA;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_SSL_MODE: &str = "prefer";
pub const DEFAULT_ENCODING: &str = "UTF8";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the staging schema used when none is configured (§3).
pub fn default_staging_schema() -> &'static str {
    DEFAULT_STAGING_SCHEMA
}
