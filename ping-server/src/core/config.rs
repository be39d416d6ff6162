/// Server configuration
///
/// # Environment variables
///
/// Every item can be overridden through the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DATABASE_PATH | ping-local.db | SQLite database file |
/// | LOG_LEVEL | info | tracing level filter |
/// | LOG_DIR | (unset) | daily-rolling log directory |
/// | PUSH_ENDPOINT | https://exp.host/--/api/v2/push/send | push gateway |
/// | EMAIL_ENDPOINT | (unset) | transactional email endpoint |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | graceful shutdown window |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/ping-local.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// SQLite database file path
    pub database_path: String,
    /// tracing level filter
    pub log_level: String,
    /// Optional daily-rolling log directory
    pub log_dir: Option<String>,
    /// Push gateway endpoint (Expo-compatible)
    pub push_endpoint: String,
    /// Transactional email endpoint; email dispatch is skipped when unset
    pub email_endpoint: Option<String>,
    /// Graceful shutdown window (milliseconds)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, using defaults for
    /// anything unset
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "ping-local.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            push_endpoint: std::env::var("PUSH_ENDPOINT")
                .unwrap_or_else(|_| "https://exp.host/--/api/v2/push/send".into()),
            email_endpoint: std::env::var("EMAIL_ENDPOINT").ok(),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Configuration pointing at a caller-provided database, used by tests
    pub fn for_tests(database_path: &str) -> Self {
        Self {
            http_port: 0,
            database_path: database_path.to_string(),
            log_level: "debug".into(),
            log_dir: None,
            push_endpoint: "http://127.0.0.1:9/push".into(),
            email_endpoint: None,
            shutdown_timeout_ms: 1_000,
        }
    }
}
