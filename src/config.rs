#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub cb_rolling_window_size: usize,
    pub cb_rolling_window_seconds: f64,
    pub cb_trip_threshold: f64,
    pub cb_cooldown_seconds: f64,
    pub cb_min_samples: usize,
    pub backoff_base_seconds: f64,
    pub backoff_max_seconds: f64,
    pub backoff_max_retries: u32,
    pub processor_timeout_seconds: f64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cb_rolling_window_size: env_parsed("CB_ROLLING_WINDOW_SIZE", 50),
            cb_rolling_window_seconds: env_parsed("CB_ROLLING_WINDOW_SECONDS", 300.0),
            cb_trip_threshold: env_parsed("CB_TRIP_THRESHOLD", 0.20),
            cb_cooldown_seconds: env_parsed("CB_COOLDOWN_SECONDS", 120.0),
            cb_min_samples: env_parsed("CB_MIN_SAMPLES", 5),
            backoff_base_seconds: env_parsed("BACKOFF_BASE_SECONDS", 0.5),
            backoff_max_seconds: env_parsed("BACKOFF_MAX_SECONDS", 30.0),
            backoff_max_retries: env_parsed("BACKOFF_MAX_RETRIES", 2),
            processor_timeout_seconds: env_parsed("PROCESSOR_TIMEOUT_SECONDS", 3.0),
        }
    }

    pub fn processor_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.processor_timeout_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            cb_rolling_window_size: 50,
            cb_rolling_window_seconds: 300.0,
            cb_trip_threshold: 0.20,
            cb_cooldown_seconds: 120.0,
            cb_min_samples: 5,
            backoff_base_seconds: 0.5,
            backoff_max_seconds: 30.0,
            backoff_max_retries: 2,
            processor_timeout_seconds: 3.0,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}
