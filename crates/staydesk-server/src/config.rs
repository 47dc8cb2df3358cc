use serde::{Deserialize, Serialize};
use staydesk_notify::NotificationConfig;
use std::path::Path;

/// Where bookings are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local; everything is lost on restart
    Memory,
    #[default]
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub tenancy: TenancyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite file; `~` is expanded
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Reject requests without `?company_id=`
    #[serde(default)]
    pub require_tenant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_sql_queries: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: DatabaseConfig::default(),
            tenancy: TenancyConfig::default(),
            logging: LoggingConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_sql_queries: false,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        // Server settings
        if let Ok(val) = std::env::var("STAYDESK_HOST") {
            self.host = val;
        }

        if let Ok(val) = std::env::var("STAYDESK_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => eprintln!("Warning: Invalid STAYDESK_PORT '{}', ignoring", val),
            }
        }

        // Database settings
        if let Ok(val) = std::env::var("STAYDESK_DB_BACKEND") {
            match val.to_lowercase().as_str() {
                "memory" => self.database.backend = StoreBackend::Memory,
                "sqlite" => self.database.backend = StoreBackend::Sqlite,
                _ => eprintln!("Warning: Invalid STAYDESK_DB_BACKEND '{}', ignoring", val),
            }
        }

        if let Ok(val) = std::env::var("STAYDESK_DB_PATH") {
            self.database.path = val;
        }

        if let Ok(val) = std::env::var("STAYDESK_DB_MAX_CONNECTIONS")
            && let Ok(max) = val.parse::<u32>()
        {
            self.database.max_connections = max;
        }

        // Tenancy
        if let Ok(val) = std::env::var("STAYDESK_REQUIRE_TENANT")
            && let Ok(required) = val.parse::<bool>()
        {
            self.tenancy.require_tenant = required;
        }

        // Logging settings
        if let Ok(val) = std::env::var("STAYDESK_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("STAYDESK_LOG_SQL_QUERIES")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.logging.log_sql_queries = enabled;
        }

        // Notifications
        if let Ok(val) = std::env::var("STAYDESK_NOTIFICATIONS_ENABLED")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.notifications.enabled = enabled;
        }

        if let Ok(val) = std::env::var("STAYDESK_NOTIFICATIONS_SENDER") {
            self.notifications.sender = val;
        }
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.database.backend == StoreBackend::Sqlite && self.database.path.trim().is_empty() {
            return Err("database.path is required for the sqlite backend".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "~/.staydesk/staydesk.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "STAYDESK_HOST",
            "STAYDESK_PORT",
            "STAYDESK_DB_BACKEND",
            "STAYDESK_DB_PATH",
            "STAYDESK_DB_MAX_CONNECTIONS",
            "STAYDESK_REQUIRE_TENANT",
            "STAYDESK_LOG_LEVEL",
            "STAYDESK_LOG_SQL_QUERIES",
            "STAYDESK_NOTIFICATIONS_ENABLED",
            "STAYDESK_NOTIFICATIONS_SENDER",
        ] {
            // SAFETY: env tests are serialized with #[serial]
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database.backend, StoreBackend::Sqlite);
        assert_eq!(config.database.path, "~/.staydesk/staydesk.db");
        assert!(!config.tenancy.require_tenant);
        assert!(config.notifications.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "port: 8088\ndatabase:\n  backend: memory\ntenancy:\n  require_tenant: true\nnotifications:\n  sender: Hotel Aurora"
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert!(config.tenancy.require_tenant);
        assert_eq!(config.notifications.sender, "Hotel Aurora");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "host = \"0.0.0.0\"\n\n[database]\npath = \"/tmp/desk.db\"\nmax_connections = 2\n\n[logging]\nlog_sql_queries = true"
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database.path, "/tmp/desk.db");
        assert_eq!(config.database.max_connections, 2);
        assert!(config.logging.log_sql_queries);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "database:\n  backend: postgres").unwrap();
        assert!(ServerConfig::from_file(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        // SAFETY: env tests are serialized with #[serial]
        unsafe {
            std::env::set_var("STAYDESK_PORT", "9100");
            std::env::set_var("STAYDESK_DB_BACKEND", "MEMORY");
            std::env::set_var("STAYDESK_REQUIRE_TENANT", "true");
            std::env::set_var("STAYDESK_LOG_LEVEL", "debug");
            std::env::set_var("STAYDESK_NOTIFICATIONS_ENABLED", "false");
        }

        let mut config = ServerConfig::default();
        config.merge_env();
        clear_env();

        assert_eq!(config.port, 9100);
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert!(config.tenancy.require_tenant);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.notifications.enabled);
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        clear_env();
        // SAFETY: env tests are serialized with #[serial]
        unsafe {
            std::env::set_var("STAYDESK_PORT", "not-a-port");
            std::env::set_var("STAYDESK_DB_BACKEND", "postgres");
            std::env::set_var("STAYDESK_REQUIRE_TENANT", "maybe");
        }

        let mut config = ServerConfig::default();
        config.merge_env();
        clear_env();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database.backend, StoreBackend::Sqlite);
        assert!(!config.tenancy.require_tenant);
    }

    #[test]
    fn test_validate() {
        let mut config = ServerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.database.path = " ".to_string();
        assert!(config.validate().is_err());

        config.database.backend = StoreBackend::Memory;
        assert!(config.validate().is_ok());
    }
}
