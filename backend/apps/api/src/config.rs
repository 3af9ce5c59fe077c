//! Server Configuration
//!
//! Everything the binary reads from the environment, gathered in one place.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose;
use dispatch::{DispatchConfig, ProviderConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_SWEEP_SECS: u64 = 300;
const DEV_IDENTITY_SECRET: &[u8] = b"fittogether-development-identity-secret";

/// Server configuration
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub frontend_origins: Vec<String>,
    pub identity_secret: Vec<u8>,
    pub dispatch: DispatchConfig,
    pub providers: ProviderConfig,
    /// How often idle rate-limit keys are dropped
    pub limiter_sweep_interval: Duration,
    /// Audit records older than this are purged at startup; `None` keeps everything
    pub audit_retention_days: Option<i64>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let identity_secret = match env::var("IDENTITY_TOKEN_SECRET") {
            Ok(secret_b64) => general_purpose::STANDARD
                .decode(secret_b64.trim())
                .context("IDENTITY_TOKEN_SECRET must be base64")?,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("IDENTITY_TOKEN_SECRET not set, using development secret");
                DEV_IDENTITY_SECRET.to_vec()
            }
            Err(_) => anyhow::bail!("IDENTITY_TOKEN_SECRET must be set in production"),
        };

        let dispatch = dispatch_config(
            parse_var("EMAIL_RATE_LIMIT_MAX")?,
            parse_var("EMAIL_RATE_LIMIT_WINDOW_SECS")?,
        )?;

        Ok(Self {
            bind_addr,
            database_url,
            frontend_origins,
            identity_secret,
            dispatch,
            providers: provider_config_from_env()?,
            limiter_sweep_interval: sweep_interval(parse_var("RATE_LIMIT_SWEEP_SECS")?)?,
            audit_retention_days: parse_var("AUDIT_RETENTION_DAYS")?,
        })
    }
}

/// The email quota is 3 per 60 s in every build; only explicit overrides change it.
fn dispatch_config(
    max_emails: Option<u32>,
    window_secs: Option<u64>,
) -> anyhow::Result<DispatchConfig> {
    let config = DispatchConfig::default();
    if max_emails.is_none() && window_secs.is_none() {
        return Ok(config);
    }

    let max_requests = max_emails.unwrap_or(config.email_rate_limit.max_requests);
    let window = window_secs.unwrap_or(config.email_rate_limit.window.as_secs());
    if max_requests == 0 || window == 0 {
        anyhow::bail!("EMAIL_RATE_LIMIT_MAX and EMAIL_RATE_LIMIT_WINDOW_SECS must be positive");
    }
    tracing::warn!(max_requests, window_secs = window, "Email quota overridden");
    Ok(config.with_email_rate_limit(max_requests, window))
}

fn sweep_interval(secs: Option<u64>) -> anyhow::Result<Duration> {
    match secs.unwrap_or(DEFAULT_SWEEP_SECS) {
        0 => anyhow::bail!("RATE_LIMIT_SWEEP_SECS must be positive"),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn provider_config_from_env() -> anyhow::Result<ProviderConfig> {
    let mut config = ProviderConfig::default();

    if let Some(secs) = parse_var::<u64>("PROVIDER_TIMEOUT_SECS")? {
        config.timeout = Duration::from_secs(secs);
    }

    override_string(&mut config.sendgrid_api_key, "SENDGRID_API_KEY");
    override_string(&mut config.sendgrid_base_url, "SENDGRID_BASE_URL");
    override_string(&mut config.sender_email, "EMAIL_SENDER_ADDRESS");
    override_string(&mut config.sender_name, "EMAIL_SENDER_NAME");
    override_string(&mut config.geocoding_api_key, "GEOCODING_API_KEY");
    override_string(&mut config.geocoding_base_url, "GEOCODING_BASE_URL");
    override_string(&mut config.places_api_key, "GOOGLE_PLACES_API_KEY");
    override_string(&mut config.places_base_url, "GOOGLE_PLACES_BASE_URL");
    override_string(&mut config.mapbox_access_token, "MAPBOX_ACCESS_TOKEN");
    override_string(&mut config.directions_base_url, "MAPBOX_BASE_URL");

    for (name, value) in [
        ("SENDGRID_API_KEY", &config.sendgrid_api_key),
        ("GEOCODING_API_KEY", &config.geocoding_api_key),
        ("GOOGLE_PLACES_API_KEY", &config.places_api_key),
        ("MAPBOX_ACCESS_TOKEN", &config.mapbox_access_token),
    ] {
        if value.is_empty() {
            tracing::warn!(variable = name, "Provider credential not set");
        }
    }

    Ok(config)
}

fn override_string(target: &mut String, name: &str) {
    if let Ok(value) = env::var(name) {
        let value = value.trim();
        if !value.is_empty() {
            *target = value.to_string();
        }
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value")),
        _ => Ok(None),
    }
}
