use std::env;
use std::str::FromStr;

/// Public BGS FROST endpoint, used when `STA_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://sensors.bgs.ac.uk/FROST-Server/v1.1";

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // SensorThings API
    pub sta_base_url: String,
    pub sta_timeout_seconds: u64,

    // Caching
    pub cache_sensors_ttl_seconds: u64,
    pub cache_observations_ttl_seconds: u64,
    pub cache_max_entries: u64,

    // Query limits
    pub sensors_list_limit: u32,
    pub observations_default_limit: u32,
    pub observations_min_limit: u32,
    pub observations_max_limit: u32,
    pub max_compare_datastreams: usize,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Application metadata
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sta_base_url: DEFAULT_BASE_URL.to_string(),
            sta_timeout_seconds: 10,
            cache_sensors_ttl_seconds: 300,
            cache_observations_ttl_seconds: 60,
            cache_max_entries: 10_000,
            sensors_list_limit: 1000,
            observations_default_limit: 200,
            observations_min_limit: 50,
            observations_max_limit: 1000,
            max_compare_datastreams: 4,
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            deployment: Deployment::Local,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset ones fall back to [`Config::default`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            // SensorThings API
            sta_base_url: env::var("STA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.sta_base_url),
            sta_timeout_seconds: parse_var("STA_TIMEOUT_SECONDS", defaults.sta_timeout_seconds)?,

            // Caching
            cache_sensors_ttl_seconds: parse_var(
                "CACHE_SENSORS_TTL_SECONDS",
                defaults.cache_sensors_ttl_seconds,
            )?,
            cache_observations_ttl_seconds: parse_var(
                "CACHE_OBSERVATIONS_TTL_SECONDS",
                defaults.cache_observations_ttl_seconds,
            )?,
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", defaults.cache_max_entries)?,

            // Query limits
            sensors_list_limit: parse_var("SENSORS_LIST_LIMIT", defaults.sensors_list_limit)?,
            observations_default_limit: parse_var(
                "OBSERVATIONS_DEFAULT_LIMIT",
                defaults.observations_default_limit,
            )?,
            observations_min_limit: parse_var(
                "OBSERVATIONS_MIN_LIMIT",
                defaults.observations_min_limit,
            )?,
            observations_max_limit: parse_var(
                "OBSERVATIONS_MAX_LIMIT",
                defaults.observations_max_limit,
            )?,
            max_compare_datastreams: parse_var(
                "MAX_COMPARE_DATASTREAMS",
                defaults.max_compare_datastreams,
            )?,

            // API settings
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_var("API_PORT", defaults.api_port)?,

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the observation limits are consistent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, default, max) = (
            self.observations_min_limit,
            self.observations_default_limit,
            self.observations_max_limit,
        );

        if min > max {
            return Err(ConfigError::Invalid {
                name: "OBSERVATIONS_MIN_LIMIT",
                value: format!("{min} (above OBSERVATIONS_MAX_LIMIT {max})"),
            });
        }
        if !(min..=max).contains(&default) {
            return Err(ConfigError::Invalid {
                name: "OBSERVATIONS_DEFAULT_LIMIT",
                value: format!("{default} (outside {min}..={max})"),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
