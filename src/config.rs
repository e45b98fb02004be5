use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Startup admin seeding; skipped entirely when unset
    pub admin: Option<AdminSeedConfig>,
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    pub tokens: TokenConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Set the Secure flag on the session cookie (HTTPS deployments)
    pub cookie_secure: bool,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            ttl_seconds: 86400, // 24 hours
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SessionConfig::default().ttl_seconds);

        let cleanup_interval_seconds = std::env::var("CLEANUP_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| TokenConfig::default().cleanup_interval_seconds);

        let admin = match (
            std::env::var("ADMIN_USERNAME").ok(),
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(username), Some(email), Some(password)) => Some(AdminSeedConfig {
                email,
                password,
                username,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::ValidationError(
                    "ADMIN_USERNAME, ADMIN_EMAIL, and ADMIN_PASSWORD must be set together"
                        .to_string(),
                ))
            }
        };

        let config = Config {
            admin,
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            sessions: SessionConfig {
                cookie_secure,
                ttl_seconds,
            },
            tokens: TokenConfig {
                cleanup_interval_seconds,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::ValidationError(
                "BIND_ADDRESS cannot be empty".to_string(),
            ));
        }
        if self.sessions.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "SESSION_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }
        if self.tokens.cleanup_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "CLEANUP_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
