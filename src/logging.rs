//! Tracing setup and log redaction.

/// Replacement text for log content that looks like SQL.
pub const REDACTED_SQL: &str = "SQL query executed (details hidden for security).";

const SQL_MARKERS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE"];

/// Hide anything that looks like a SQL statement before it reaches the logs.
pub fn redact_sql(content: &str) -> &str {
    let upper = content.to_uppercase();
    if SQL_MARKERS.iter().any(|marker| upper.contains(marker)) {
        REDACTED_SQL
    } else {
        content
    }
}

/// Initialize the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
