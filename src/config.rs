//! Configuration management for SisBib server

use chrono::Weekday;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::{env, time::Duration};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub smtp_from_name: Option<String>,
    pub smtp_use_tls: bool,
    pub timeout_secs: u64,
    /// Default recipient for the mail smoke test
    pub test_recipient: Option<String>,
}

/// Loan policy: due-date offsets, sanctions and the reconditioning delay
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoansConfig {
    pub room_minutes: i64,
    pub home_days: i64,
    pub min_sanction_days: i64,
    pub release_delay_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    pub weekly_enabled: bool,
    /// Three-letter weekday ("mon", "tue", ...)
    pub weekday: String,
    /// Hour of day (UTC) of the weekly sweep
    pub hour: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub loans: LoansConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables with prefix SISBIB_ (e.g. SISBIB_LOANS__HOME_DAYS)
            .add_source(
                Environment::with_prefix("SISBIB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables used by existing deployments
            .set_override_option("database.host", env::var("DB_HOST").ok())?
            .set_override_option("database.port", env::var("DB_PORT").ok())?
            .set_override_option("database.name", env::var("DB_NAME").ok())?
            .set_override_option("database.user", env::var("DB_USER").ok())?
            .set_override_option("database.password", env::var("DB_PASSWORD").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("email.smtp_host", env::var("SMTP_HOST").ok())?
            .set_override_option("email.smtp_port", env::var("SMTP_PORT").ok())?
            .set_override_option("email.smtp_username", env::var("SMTP_USERNAME").ok())?
            .set_override_option("email.smtp_password", env::var("SMTP_PASSWORD").ok())?
            .set_override_option("email.smtp_from", env::var("SMTP_FROM").ok())?
            .set_override_option("email.smtp_use_tls", env::var("SMTP_USE_TLS").ok())?
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.notifications.weekday()?;
        if self.notifications.hour > 23 {
            return Err(ConfigError::Message(format!(
                "notifications.hour must be between 0 and 23, got {}",
                self.notifications.hour
            )));
        }
        let loans = &self.loans;
        if loans.room_minutes <= 0 || loans.home_days <= 0 {
            return Err(ConfigError::Message(
                "loan due-date offsets must be positive".to_string(),
            ));
        }
        if loans.min_sanction_days < 0 || loans.release_delay_minutes < 0 {
            return Err(ConfigError::Message(
                "loans.min_sanction_days and loans.release_delay_minutes cannot be negative"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Connection options for the PostgreSQL pool
    pub fn connect_options(&self) -> PgConnectOptions {
        let statement_timeout = format!("{}s", self.statement_timeout_secs);
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.user)
            .password(&self.password)
            .options([("statement_timeout", statement_timeout.as_str())])
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl NotificationsConfig {
    pub fn weekday(&self) -> Result<Weekday, ConfigError> {
        self.weekday.trim().parse::<Weekday>().map_err(|_| {
            ConfigError::Message(format!("Invalid notifications.weekday: {}", self.weekday))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            name: "sisbib".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 5,
            statement_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@sisbib.cl".to_string(),
            smtp_from_name: Some("Biblioteca".to_string()),
            smtp_use_tls: true,
            timeout_secs: 10,
            test_recipient: None,
        }
    }
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            room_minutes: 120,
            home_days: 7,
            min_sanction_days: 1,
            release_delay_minutes: 30,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            weekly_enabled: true,
            weekday: "mon".to_string(),
            hour: 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.loans.room_minutes, 120);
        assert_eq!(config.loans.home_days, 7);
        assert_eq!(config.loans.release_delay_minutes, 30);
        assert_eq!(config.notifications.weekday().unwrap(), Weekday::Mon);
    }

    #[test]
    fn test_rejects_bad_weekday_and_hour() {
        let mut config = AppConfig::default();
        config.notifications.weekday = "someday".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.notifications.hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_offsets() {
        let mut config = AppConfig::default();
        config.loans.home_days = 0;
        assert!(config.validate().is_err());
    }
}
