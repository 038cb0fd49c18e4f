//! Application-level configuration loading: JSON file, built-in defaults and environment overrides.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{bracket::Contestant, catalog::WorldCup};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KPOP_ARENA_CONFIG_PATH";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
const DEFAULT_SESSION_TTL_MINUTES: u64 = 60;
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GENERATED_SECRET_LEN: usize = 48;

/// Deployment flavour; development relaxes rate limits and CORS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Endpoints and credentials of the OAuth authorization-code exchange.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub token_url: String,
    pub userinfo_url: String,
}

impl OAuthConfig {
    /// Whether enough is configured to perform a code exchange.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Ad reward settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsConfig {
    pub cooldown_minutes: i64,
    pub max_reward_points: i64,
}

/// Per-IP request quotas, already scaled for the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub api_max_requests: u32,
    pub submission_max_requests: u32,
    /// Reverse proxies in front of the server whose `X-Forwarded-For` entries are trusted,
    /// counted from the right. 0 keys clients on the socket peer.
    pub trusted_proxy_hops: usize,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub session_ttl: Duration,
    pub cors_origin: Option<String>,
    pub oauth: OAuthConfig,
    pub ads: AdsConfig,
    pub rate_limits: RateLimitConfig,
    pub cups: Vec<WorldCup>,
}

impl AppConfig {
    /// Load the configuration file, then apply the process environment on top of it.
    pub fn load() -> Self {
        Self::from_sources(read_raw_config(), |key| env::var(key).ok())
    }

    /// Build the configuration from a parsed file and an environment lookup.
    pub fn from_sources(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown APP_ENV; keeping configured environment");
                raw.environment
            }),
            None => raw.environment,
        };

        let port = match lookup("PORT").map(|value| value.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(err)) => {
                warn!(error = %err, port = raw.port, "invalid PORT; keeping configured port");
                raw.port
            }
            None => raw.port,
        };

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET is not set; generating a per-process secret, tokens will not survive a restart");
            generate_secret()
        });

        let multiplier = if environment.is_development() {
            raw.rate_limits.development_multiplier.max(1)
        } else {
            1
        };
        let rate_limits = RateLimitConfig {
            window: Duration::from_secs(raw.rate_limits.window_minutes.max(1).saturating_mul(60)),
            api_max_requests: raw.rate_limits.api_max_requests.saturating_mul(multiplier),
            submission_max_requests: raw
                .rate_limits
                .submission_max_requests
                .saturating_mul(multiplier),
            trusted_proxy_hops: raw.rate_limits.trusted_proxy_hops,
        };

        let oauth = OAuthConfig {
            client_id: lookup("OAUTH_CLIENT_ID"),
            client_secret: lookup("OAUTH_CLIENT_SECRET"),
            redirect_uri: lookup("OAUTH_REDIRECT_URI"),
            token_url: raw
                .oauth
                .token_url
                .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_owned()),
            userinfo_url: raw
                .oauth
                .userinfo_url
                .unwrap_or_else(|| GOOGLE_USERINFO_URL.to_owned()),
        };

        Self {
            environment,
            port,
            database_url: lookup("DATABASE_URL"),
            jwt_secret,
            token_ttl: Duration::from_secs(raw.token_ttl_hours.max(1).saturating_mul(3600)),
            session_ttl: Duration::from_secs(raw.session_ttl_minutes.max(1).saturating_mul(60)),
            cors_origin: lookup("CORS_ORIGIN").or(raw.cors_origin),
            oauth,
            ads: AdsConfig {
                cooldown_minutes: raw.ads.cooldown_minutes,
                max_reward_points: raw.ads.max_reward_points,
            },
            rate_limits,
            cups: raw.cups.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_sources(RawConfig::default(), |_| None)
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawConfig {
    environment: Environment,
    port: u16,
    token_ttl_hours: u64,
    session_ttl_minutes: u64,
    cors_origin: Option<String>,
    oauth: RawOAuth,
    ads: RawAds,
    rate_limits: RawRateLimits,
    cups: Vec<RawCup>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            port: DEFAULT_PORT,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            cors_origin: None,
            oauth: RawOAuth::default(),
            ads: RawAds::default(),
            rate_limits: RawRateLimits::default(),
            cups: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOAuth {
    token_url: Option<String>,
    userinfo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawAds {
    cooldown_minutes: i64,
    max_reward_points: i64,
}

impl Default for RawAds {
    fn default() -> Self {
        Self {
            cooldown_minutes: 15,
            max_reward_points: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawRateLimits {
    window_minutes: u64,
    api_max_requests: u32,
    submission_max_requests: u32,
    development_multiplier: u32,
    trusted_proxy_hops: usize,
}

impl Default for RawRateLimits {
    fn default() -> Self {
        Self {
            window_minutes: 15,
            api_max_requests: 100,
            submission_max_requests: 20,
            development_multiplier: 100,
            trusted_proxy_hops: 1,
        }
    }
}

/// JSON representation of one world cup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCup {
    id: String,
    title: String,
    participants: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParticipant {
    name: String,
    video_id: String,
    thumbnail: Option<String>,
}

impl From<RawCup> for WorldCup {
    fn from(value: RawCup) -> Self {
        Self {
            id: value.id,
            title: value.title,
            contestants: value.participants.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RawParticipant> for Contestant {
    fn from(value: RawParticipant) -> Self {
        let thumbnail_ref = value
            .thumbnail
            .unwrap_or_else(|| format!("https://img.youtube.com/vi/{}/0.jpg", value.video_id));
        Self {
            name: value.name,
            media_ref: value.video_id,
            thumbnail_ref,
        }
    }
}

fn read_raw_config() -> RawConfig {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(
                    path = %path.display(),
                    cups = raw.cups.len(),
                    "loaded configuration file"
                );
                raw
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                RawConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            RawConfig::default()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            RawConfig::default()
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}
