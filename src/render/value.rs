//! Sampled row values as a scalar sum type, classified from the Postgres
//! type name of the column they came from. The sampling engine projects every
//! column pre-cast to `text` (`sampling::query`), so classification happens
//! once here rather than via per-type `sqlx` decoding; `render_literal` then
//! dispatches on the variant instead of quoting everything uniformly.
use crate::render::escape_string;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Floating(f64),
    /// Arbitrary-precision decimal/money text, kept verbatim so the exact
    /// digits round-trip instead of going through a lossy f64 conversion.
    Numeric(String),
    Text(String),
    Bytes(String),
    Json(String),
    Array(String),
}

enum TypeFamily {
    Boolean,
    Integer,
    Floating,
    Numeric,
    Text,
    Bytes,
    Json,
    Array,
}

fn classify(data_type: &str) -> TypeFamily {
    let t = data_type.trim().to_lowercase();
    if t.ends_with("[]") {
        return TypeFamily::Array;
    }
    match t.as_str() {
        "boolean" | "bool" => TypeFamily::Boolean,
        "smallint" | "integer" | "int" | "int2" | "int4" | "bigint" | "int8" | "serial"
        | "bigserial" | "smallserial" => TypeFamily::Integer,
        "real" | "double precision" | "float4" | "float8" => TypeFamily::Floating,
        "numeric" | "decimal" | "money" => TypeFamily::Numeric,
        "bytea" => TypeFamily::Bytes,
        "json" | "jsonb" => TypeFamily::Json,
        _ => TypeFamily::Text,
    }
}

impl SqlValue {
    /// Build a value from a column's declared Postgres type and its
    /// `::text`-cast contents. `None` is always `Null` regardless of type —
    /// excluded columns are projected as SQL `NULL` upstream.
    pub fn from_text(data_type: &str, raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return SqlValue::Null;
        };
        match classify(data_type) {
            TypeFamily::Boolean => match raw.as_str() {
                "t" | "true" | "TRUE" => SqlValue::Boolean(true),
                "f" | "false" | "FALSE" => SqlValue::Boolean(false),
                _ => SqlValue::Text(raw),
            },
            TypeFamily::Integer => raw
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or(SqlValue::Text(raw)),
            TypeFamily::Floating => raw
                .parse::<f64>()
                .map(SqlValue::Floating)
                .unwrap_or(SqlValue::Text(raw)),
            TypeFamily::Numeric => SqlValue::Numeric(raw),
            TypeFamily::Bytes => SqlValue::Bytes(raw),
            TypeFamily::Json => SqlValue::Json(raw),
            TypeFamily::Array => SqlValue::Array(raw),
            TypeFamily::Text => SqlValue::Text(raw),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Canonical string form for set-membership/tuple-equality comparisons in
    /// the FK-closure and integrity-verification logic, which only care about
    /// value identity, not literal formatting. `None` for NULL, since a NULL
    /// component can never participate in a key comparison.
    pub fn as_comparable(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Boolean(b) => Some(b.to_string()),
            SqlValue::Integer(n) => Some(n.to_string()),
            SqlValue::Floating(f) => Some(f.to_string()),
            SqlValue::Numeric(s)
            | SqlValue::Text(s)
            | SqlValue::Bytes(s)
            | SqlValue::Json(s)
            | SqlValue::Array(s) => Some(s.clone()),
        }
    }
}

/// §4.6's literal-formatting rules: `NULL` unquoted, booleans as `TRUE`/
/// `FALSE` unquoted, numerics unquoted (preserving `NUMERIC`'s exact decimal
/// text rather than reformatting through a float), everything else a
/// single-quoted, doubled-quote-escaped string literal.
pub fn render_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Floating(f) if f.is_finite() => f.to_string(),
        SqlValue::Floating(f) => escape_string(&f.to_string()),
        SqlValue::Numeric(s) => s.clone(),
        SqlValue::Text(s) | SqlValue::Bytes(s) | SqlValue::Json(s) | SqlValue::Array(s) => {
            escape_string(s)
        }
    }
}
