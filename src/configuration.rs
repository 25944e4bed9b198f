use crate::error::ConfigError;

/// Shortest HS256 secret accepted at startup.
pub const MIN_SECRET_LENGTH: usize = 32;
/// bcrypt's accepted cost range.
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;
/// Longest session lifetime accepted at startup (one year).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;
/// Below this bcrypt cost hashing is too fast to slow down brute force.
pub const RECOMMENDED_MIN_HASH_COST: u32 = 10;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub password: PasswordSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Session token settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    /// Symmetric signing key, shared by every instance
    pub secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: i64, // 86400 = 24 hours
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct PasswordSettings {
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            hash_cost: default_hash_cost(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

fn default_max_body_bytes() -> usize {
    4096
}

fn default_max_connections() -> u32 {
    5
}

fn default_token_ttl() -> i64 {
    24 * 60 * 60
}

fn default_issuer() -> String {
    "fintrack".to_string()
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Settings {
    /// Reject settings the service must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.jwt.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if !(1..=MAX_TOKEN_TTL_SECONDS).contains(&self.jwt.token_ttl_seconds) {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.token_ttl_seconds must be between 1 and {}",
                MAX_TOKEN_TTL_SECONDS
            )));
        }
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.password.hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.hash_cost must be between {} and {}",
                MIN_HASH_COST, MAX_HASH_COST
            )));
        }
        Ok(())
    }
}

/// Load `configuration.{yaml,toml,json}` then `APP_*` environment overrides,
/// e.g. `APP_JWT__SECRET` or `APP_APPLICATION__PORT`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
