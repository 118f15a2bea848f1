pub mod tracing;

use std::time::Duration;

use figment::providers::{Env, Format, Json};
use figment::Figment;
use serde::Deserialize;

/// Settings from `appsettings.json`, overridden by `APP_*` environment
/// variables.
#[derive(Deserialize, Debug, Clone)]
pub struct AppCfg {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub database_url: String,
    #[serde(default = "default_db_pool_size")]
    pub db_pool_size: usize,
    /// When unset the feed cache lives in process memory.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_redis_pool_size")]
    pub redis_pool_size: usize,
    /// Bound on each cache call and on acquiring a cache connection.
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    /// Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_db_pool_size() -> usize {
    10
}

fn default_redis_pool_size() -> usize {
    8
}

fn default_cache_timeout_ms() -> u64 {
    500
}

fn default_token_ttl_secs() -> i64 {
    24 * 60 * 60
}

fn default_operation_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".into()
}

impl AppCfg {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Json::file("appsettings.json"))
            .merge(Env::prefixed("APP_"))
    }

    pub fn load() -> figment::Result<Self> {
        Self::figment().extract()
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_file_and_defaults_fill_in() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "appsettings.json",
                r#"{ "database_url": "postgres://file/db", "jwt_secret": "from-file" }"#,
            )?;
            jail.set_env("APP_JWT_SECRET", "from-env");
            jail.set_env("APP_REDIS_URL", "redis://cache:6379");

            let cfg = AppCfg::load()?;
            assert_eq!(cfg.database_url, "postgres://file/db");
            assert_eq!(cfg.jwt_secret, "from-env");
            assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379"));
            assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
            assert_eq!(cfg.operation_timeout(), Duration::from_secs(10));
            assert_eq!(cfg.cache_timeout(), Duration::from_millis(500));
            assert!(cfg.cors_origins.is_empty());
            Ok(())
        });
    }

    #[test]
    fn missing_secret_is_an_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_DATABASE_URL", "postgres://env/db");
            assert!(AppCfg::load().is_err());
            Ok(())
        });
    }
}
