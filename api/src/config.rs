use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FAST_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_CAPABLE_MODEL: &str = "claude-sonnet-4-5-20250929";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("either SUPABASE_JWT_SECRET or SUPABASE_URL and SUPABASE_ANON_KEY must be set")]
    MissingIdentityProvider,
}

/// Quality/cost class of completion model used by a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheap, low-latency model for safety screening
    Fast,
    /// Higher-capability model for analysis, plans, and check-ins
    Capable,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Capable => "capable",
        }
    }
}

/// Mapping from tier to provider model id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTiers {
    pub fast: String,
    pub capable: String,
}

impl ModelTiers {
    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Capable => &self.capable,
        }
    }
}

impl Default for ModelTiers {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_MODEL.to_string(),
            capable: DEFAULT_CAPABLE_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// How bearer tokens are resolved to user ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityConfig {
    /// Verify HS256 access tokens locally with the project JWT secret.
    Jwt { secret: String, audience: String },
    /// Ask the hosted auth service who the token belongs to.
    Remote { auth_url: String, api_key: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub completion: CompletionConfig,
    pub model_tiers: ModelTiers,
    pub identity: IdentityConfig,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let identity = match get("SUPABASE_JWT_SECRET") {
            Some(secret) => IdentityConfig::Jwt {
                secret,
                audience: get("SUPABASE_JWT_AUDIENCE").unwrap_or_else(|| "authenticated".to_string()),
            },
            None => match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
                (Some(auth_url), Some(api_key)) => IdentityConfig::Remote {
                    auth_url: auth_url.trim_end_matches('/').to_string(),
                    api_key,
                },
                _ => return Err(ConfigError::MissingIdentityProvider),
            },
        };

        let defaults = ModelTiers::default();
        let model_tiers = ModelTiers {
            fast: get("REJUUV_MODEL_FAST").unwrap_or(defaults.fast),
            capable: get("REJUUV_MODEL_CAPABLE").unwrap_or(defaults.capable),
        };

        let cors_origins = get("REJUUV_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8081".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 20)?,
            port: parse_or(&get, "PORT", 3000)?,
            completion: CompletionConfig {
                api_key: required("ANTHROPIC_API_KEY")?,
                base_url: get("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|| "https://api.anthropic.com".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                max_tokens: parse_or(&get, "REJUUV_COMPLETION_MAX_TOKENS", 4096)?,
                timeout: Duration::from_secs(parse_or(&get, "REJUUV_COMPLETION_TIMEOUT_SECS", 60)?),
            },
            model_tiers,
            identity,
            cors_origins,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
