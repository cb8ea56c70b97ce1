//! Limit Rule Engine (C3): parses `pattern=value` sampling rules and decides,
//! per table, how much of it to pull.
use crate::constants::DEFAULT_ROW_LIMIT;
use glob::Pattern;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum LimitType {
    Numeric(i64),
    Percentage(f64),
    Full,
    Conditional(String),
}

#[derive(Debug, Clone)]
pub struct LimitRule {
    pub pattern: String,
    pub limit: LimitType,
}

/// Ordered rule set; first pattern match wins, default `NUMERIC(100)`.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<LimitRule>,
}

impl RuleSet {
    /// Parse `--limit` arguments: each element may itself hold several
    /// comma-separated `pattern=value` pairs; order across and within
    /// arguments is preserved as declaration order.
    pub fn parse(raw: &[String]) -> anyhow::Result<Self> {
        let mut rules = Vec::new();
        for arg in raw {
            for pair in arg.split(',') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                let (pattern, value) = pair.split_once('=').ok_or_else(|| {
                    anyhow::anyhow!("invalid limit rule {pair:?}: expected PATTERN=VALUE")
                })?;
                rules.push(LimitRule {
                    pattern: pattern.trim().to_string(),
                    limit: parse_value(value.trim()),
                });
            }
        }
        Ok(Self { rules })
    }

    /// First rule whose pattern matches `schema.table`, falling back to the
    /// bare table name and then `schema.*`; default is `NUMERIC(100)`.
    pub fn resolve(&self, schema: &str, table: &str) -> LimitType {
        let qualified = format!("{schema}.{table}");
        for rule in &self.rules {
            if pattern_matches(&rule.pattern, &qualified, table, schema) {
                return rule.limit.clone();
            }
        }
        LimitType::Numeric(DEFAULT_ROW_LIMIT)
    }

    /// Non-fatal diagnostic: rules whose pattern matched none of `tables`.
    pub fn warn_unmatched(&self, tables: &[(String, String)]) {
        for rule in &self.rules {
            let matched = tables
                .iter()
                .any(|(schema, table)| {
                    pattern_matches(&rule.pattern, &format!("{schema}.{table}"), table, schema)
                });
            if !matched {
                warn!(pattern = %rule.pattern, "limit rule pattern matched no tables");
            }
        }
    }
}

fn parse_value(value: &str) -> LimitType {
    if value == "*" {
        return LimitType::Full;
    }
    if let Some(prefix) = value.strip_suffix('%')
        && let Ok(pct) = prefix.parse::<f64>()
    {
        return LimitType::Percentage(pct);
    }
    if let Ok(n) = value.parse::<i64>() {
        return LimitType::Numeric(n);
    }
    LimitType::Conditional(value.to_string())
}

/// Case-insensitive glob match against the three accepted forms.
fn pattern_matches(pattern: &str, qualified: &str, table: &str, schema: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let Ok(glob) = Pattern::new(&pattern) else {
        return false;
    };
    if glob.matches(&qualified.to_lowercase()) {
        return true;
    }
    if glob.matches(&table.to_lowercase()) {
        return true;
    }
    let schema_star = format!("{}.*", schema.to_lowercase());
    pattern == schema_star
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_variants() {
        assert_eq!(parse_value("*"), LimitType::Full);
        assert_eq!(parse_value("50%"), LimitType::Percentage(50.0));
        assert_eq!(parse_value("200"), LimitType::Numeric(200));
        assert_eq!(
            parse_value("status = 'active'"),
            LimitType::Conditional("status = 'active'".to_string())
        );
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let rules = RuleSet::parse(&["app.orders=50,app.*=10".to_string()]).unwrap();
        assert_eq!(rules.resolve("app", "orders"), LimitType::Numeric(50));
        assert_eq!(rules.resolve("app", "customers"), LimitType::Numeric(10));
    }

    #[test]
    fn test_resolve_default_when_no_match() {
        let rules = RuleSet::parse(&["app.orders=50".to_string()]).unwrap();
        assert_eq!(
            rules.resolve("public", "widgets"),
            LimitType::Numeric(DEFAULT_ROW_LIMIT)
        );
    }

    #[test]
    fn test_wildcard_table_pattern_matches_bare_name() {
        let rules = RuleSet::parse(&["use*=full".to_string()]).unwrap();
        // "full" isn't a recognized keyword, so this becomes Conditional;
        // use the canonical `*` keyword to check glob matching behavior instead.
        let rules2 = RuleSet::parse(&["use*=*".to_string()]).unwrap();
        assert_eq!(rules2.resolve("public", "users"), LimitType::Full);
        assert!(matches!(
            rules.resolve("public", "users"),
            LimitType::Conditional(_)
        ));
    }

    #[test]
    fn test_case_insensitive_match() {
        let rules = RuleSet::parse(&["App.Orders=5".to_string()]).unwrap();
        assert_eq!(rules.resolve("app", "orders"), LimitType::Numeric(5));
    }

    #[test]
    fn test_schema_star_pattern() {
        let rules = RuleSet::parse(&["reporting.*=1%".to_string()]).unwrap();
        assert_eq!(
            rules.resolve("reporting", "anything"),
            LimitType::Percentage(1.0)
        );
        assert_eq!(
            rules.resolve("app", "anything"),
            LimitType::Numeric(DEFAULT_ROW_LIMIT)
        );
    }
}
