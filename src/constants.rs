use std::time::Duration;

// Default row cap applied when no limit rule matches a table (4.3).
pub const DEFAULT_ROW_LIMIT: i64 = 100;

// Safety cap on FK-closure fixpoint rounds: |tables| + 1 (4.4.2).
pub const FIXPOINT_ROUND_MARGIN: usize = 1;

// Staging mode auto-enable thresholds (4.4.3).
pub const STAGING_AUTO_TABLE_COUNT: usize = 50;
pub const STAGING_AUTO_FK_COUNT: usize = 5;

// Default staging schema name (§3 Staging schema).
pub const DEFAULT_STAGING_SCHEMA: &str = "_dbsample";

// Connection retry defaults, mirrored from the teacher's db::connection module.
pub const CONNECT_MAX_RETRIES: u32 = 5;
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(200);

// Config file discovery.
pub const CONFIG_FILENAME: &str = "dbsample.yaml";

// Integrity verifier: cap on sample violation tuples reported per constraint (4.5).
pub const MAX_REPORTED_VIOLATIONS: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_constants() {
        assert!(CONNECT_RETRY_DELAY > Duration::from_millis(0));
    }

    #[test]
    fn test_row_limit_is_positive() {
        assert!(DEFAULT_ROW_LIMIT > 0);
    }
}
