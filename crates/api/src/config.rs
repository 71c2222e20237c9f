use stockroom_core::locking::{LockPolicy, LONG_LOCK_EXPIRY_SECS};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for in-flight requests on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Record lock expiry and release behaviour.
    pub locks: LockPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                       |
    /// | `PRODUCT_LOCK_EXPIRY_SECS`     | `300`                      |
    /// | `TRANSACTION_LOCK_EXPIRY_SECS` | `300`                      |
    /// | `LOCK_AUTO_RELEASE_ON_MUTATE`  | `false`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let locks = lock_policy_from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            locks,
        }
    }
}

/// Read the lock policy from the environment. Panics on invalid values so
/// misconfiguration fails at startup.
fn lock_policy_from_env() -> LockPolicy {
    let default_expiry = LONG_LOCK_EXPIRY_SECS.to_string();

    let product_expiry_secs: i64 = std::env::var("PRODUCT_LOCK_EXPIRY_SECS")
        .unwrap_or_else(|_| default_expiry.clone())
        .parse()
        .expect("PRODUCT_LOCK_EXPIRY_SECS must be a valid i64");

    let transaction_expiry_secs: i64 = std::env::var("TRANSACTION_LOCK_EXPIRY_SECS")
        .unwrap_or(default_expiry)
        .parse()
        .expect("TRANSACTION_LOCK_EXPIRY_SECS must be a valid i64");

    let auto_release_on_mutate = parse_flag(
        &std::env::var("LOCK_AUTO_RELEASE_ON_MUTATE").unwrap_or_else(|_| "false".into()),
    )
    .expect("LOCK_AUTO_RELEASE_ON_MUTATE must be true or false");

    let policy = LockPolicy {
        product_expiry_secs,
        transaction_expiry_secs,
        auto_release_on_mutate,
    };
    if let Err(e) = policy.validate() {
        panic!("Invalid lock configuration: {e}");
    }
    policy
}

/// Parse a boolean environment flag.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
