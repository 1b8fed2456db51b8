use dotenv::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

const DEV_API_BASE_URL: &str = "http://localhost:3000/api";
const PROD_API_BASE_URL: &str = "https://api.patitasfelices.com/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn default_api_base_url(&self) -> &'static str {
        match self {
            Environment::Development => DEV_API_BASE_URL,
            Environment::Production => PROD_API_BASE_URL,
        }
    }

    pub fn default_log_level(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Production => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub api_base_url: String,
    pub debug: bool,
    pub log_level: String,
    pub bind_address: String,
    pub session_cookie: String,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
    /// Problems found while reading the environment. Logged by `main` once the
    /// logger exists, since `global()` runs before it.
    pub warnings: Vec<String>,
}

impl AppConfig {

    pub fn global() -> &'static AppConfig {
        CONFIG.get_or_init(|| {
            dotenv().ok();
            AppConfig::from_lookup(|key| env::var(key).ok())
        })
    }

    pub fn from_lookup<F>(lookup: F) -> AppConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut warnings = Vec::new();

        let environment = read("APP_ENV")
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Development);

        let debug = match read("DEBUG") {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    warnings.push(format!("Ignoring invalid DEBUG value '{}'", other));
                    environment == Environment::Development
                }
            },
            None => environment == Environment::Development,
        };

        let mut seconds = |key: &str, default: u64| match read(key) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warnings.push(format!("Ignoring invalid {} value '{}'", key, value));
                    Duration::from_secs(default)
                }
            },
            None => Duration::from_secs(default),
        };

        let request_timeout = seconds("REQUEST_TIMEOUT_SECS", 15);
        let session_ttl = seconds("SESSION_TTL_SECS", 8 * 60 * 60);

        AppConfig {
            environment,
            api_base_url: read("API_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| environment.default_api_base_url().to_string()),
            debug,
            log_level: read("LOG_LEVEL")
                .unwrap_or_else(|| environment.default_log_level().to_string()),
            bind_address: read("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            session_cookie: read("SESSION_COOKIE").unwrap_or_else(|| "patitas_session".to_string()),
            request_timeout,
            session_ttl,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert!(config.debug);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.session_cookie, "patitas_session");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.session_ttl, Duration::from_secs(28800));
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_production_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("APP_ENV", "Production")]));

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api_base_url, "https://api.patitasfelices.com/api");
        assert!(!config.debug);
        assert_eq!(config.log_level, "error");
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("API_BASE_URL", "http://localhost:3001/api/"),
            ("DEBUG", "false"),
            ("LOG_LEVEL", "info"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("SESSION_COOKIE", "sid"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("SESSION_TTL_SECS", "600"),
        ]));

        assert_eq!(config.api_base_url, "http://localhost:3001/api");
        assert!(!config.debug);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.session_cookie, "sid");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.session_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DEBUG", "maybe"),
            ("REQUEST_TIMEOUT_SECS", "zero"),
            ("SESSION_TTL_SECS", "0"),
            ("API_BASE_URL", "   "),
        ]));

        assert!(config.debug);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.session_ttl, Duration::from_secs(28800));
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert_eq!(
            config.warnings,
            vec![
                "Ignoring invalid DEBUG value 'maybe'".to_string(),
                "Ignoring invalid REQUEST_TIMEOUT_SECS value 'zero'".to_string(),
                "Ignoring invalid SESSION_TTL_SECS value '0'".to_string(),
            ]
        );
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("prod"), Environment::Production);
        assert_eq!(Environment::parse(" PRODUCTION "), Environment::Production);
        assert_eq!(Environment::parse("dev"), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn test_config_is_singleton() {
        temp_env::with_vars(vec![
            ("APP_ENV", Some("development")),
            ("API_BASE_URL", Some("http://localhost:3000/api")),
        ], || {
            let config1 = AppConfig::global();
            let config2 = AppConfig::global();

            assert!(std::ptr::eq(config1, config2));
        });
    }
}
