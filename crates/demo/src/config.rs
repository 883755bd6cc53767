use std::env;

/// Demo configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Change-feed channel capacity.
    pub bus_capacity: usize,
    /// Milliseconds between simulated admin writes.
    pub write_interval_ms: u64,
    /// Equipment records seeded before the views open.
    pub seed_count: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl DemoConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            bus_capacity: env::var("BUS_CAPACITY")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .expect("BUS_CAPACITY must be a valid usize"),
            write_interval_ms: env::var("WRITE_INTERVAL_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .expect("WRITE_INTERVAL_MS must be a valid u64"),
            seed_count: env::var("SEED_COUNT")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("SEED_COUNT must be a valid usize"),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
