// Start of file: /src/config/environment.rs

// * Environment configuration with a singleton pattern
// * and zero-copy parsing.

use std::{borrow::Cow, collections::HashMap};
// * anyhow for convenient error handling
use anyhow::{Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "dashboard";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT: u64 = 3; // 3 seconds
const DEFAULT_DB_PORT: u16 = 5432; // Default Postgres port
const DEFAULT_REVENUE_CACHE_TTL: u64 = 300; // 5 minutes

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub protocol: Cow<'static, str>,
    pub default_timeout_seconds: u64,
    pub db_host: Cow<'static, str>,
    pub db_port: u16,
    pub db_user: Cow<'static, str>,
    pub db_password: Cow<'static, str>,
    pub db_name: Cow<'static, str>,
    pub redis_url: Cow<'static, str>,
    pub revenue_cache_ttl_seconds: u64,
    // Optional JSON file overriding the built-in fallback property table
    pub fallback_properties_file: Option<String>,
    // When false, malformed-query errors surface as 500 instead of falling back
    pub fallback_on_query_error: bool,
}

impl Default for EnvironmentVariables {
    fn default() -> Self {
        Self {
            environment: Cow::Borrowed(DEFAULT_ENVIRONMENT),
            host: Cow::Borrowed(DEFAULT_HOST),
            port: DEFAULT_PORT,
            protocol: Cow::Borrowed(DEFAULT_PROTOCOL),
            default_timeout_seconds: DEFAULT_TIMEOUT,
            db_host: Cow::Borrowed(DEFAULT_DB_HOST),
            db_port: DEFAULT_DB_PORT,
            db_user: Cow::Borrowed(DEFAULT_DB_USER),
            db_password: Cow::Borrowed(DEFAULT_DB_PASSWORD),
            db_name: Cow::Borrowed(DEFAULT_DB_NAME),
            redis_url: Cow::Borrowed(DEFAULT_REDIS_URL),
            revenue_cache_ttl_seconds: DEFAULT_REVENUE_CACHE_TTL,
            fallback_properties_file: None,
            fallback_on_query_error: true,
        }
    }
}

impl EnvironmentVariables {
    // * Loads environment variables.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        // * Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars()
            .chain(dotenv::vars())
            .collect();

        Self::from_vars(&vars)
    }

    // * Builds the configuration from an explicit variable map, providing defaults if missing
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        // * A small helper closure to fetch a variable by key
        let get_var = |key: &str| vars.get(key).map(String::as_str);

        Ok(Self {
            environment: get_var("ENVIRONMENT")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                    Cow::Borrowed(DEFAULT_ENVIRONMENT)
                }),

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            protocol: get_var("PROTOCOL")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_PROTOCOL)),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            db_host: get_var("DB_HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_HOST, defaulting to '{DEFAULT_DB_HOST}'");
                    Cow::Borrowed(DEFAULT_DB_HOST)
                }),

            db_port: get_var("DB_PORT")
                .map(|s| s.parse().context("Invalid DB_PORT"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_PORT),

            db_user: get_var("DB_USER")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_USER, defaulting to '{DEFAULT_DB_USER}'");
                    Cow::Borrowed(DEFAULT_DB_USER)
                }),

            db_password: get_var("DB_PASSWORD")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_PASSWORD, defaulting to '{DEFAULT_DB_PASSWORD}'");
                    Cow::Borrowed(DEFAULT_DB_PASSWORD)
                }),

            db_name: get_var("DB_NAME")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_NAME, defaulting to '{DEFAULT_DB_NAME}'");
                    Cow::Borrowed(DEFAULT_DB_NAME)
                }),

            redis_url: get_var("REDIS_URL")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing REDIS_URL, defaulting to '{DEFAULT_REDIS_URL}'");
                    Cow::Borrowed(DEFAULT_REDIS_URL)
                }),

            revenue_cache_ttl_seconds: get_var("REVENUE_CACHE_TTL_SECONDS")
                .map(|s| s.parse().context("Invalid REVENUE_CACHE_TTL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_REVENUE_CACHE_TTL),

            fallback_properties_file: get_var("FALLBACK_PROPERTIES_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned),

            fallback_on_query_error: get_var("FALLBACK_ON_QUERY_ERROR")
                .map(|s| s.parse().context("Invalid FALLBACK_ON_QUERY_ERROR (expected true/false)"))
                .transpose()?
                .unwrap_or(true),
        })
    }

    // * Returns the lazily-initialized environment configuration.
    // * A load failure is kept and handed to every caller as an error.
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: Lazy<Result<EnvironmentVariables, anyhow::Error>> = Lazy::new(|| {
            let config: EnvironmentVariables = EnvironmentVariables::load()?;

            if cfg!(debug_assertions) {
                tracing::debug!("Loaded environment configuration: {:#?}", config);
            }

            Ok(config)
        });

        INSTANCE
            .as_ref()
            .map_err(|e| anyhow::anyhow!("Failed to load environment configuration: {e:#}"))
    }
}


// End of file: /src/config/environment.rs
