//! Application Configuration
//!
//! Tunables for the command gateway and the provider endpoints it talks to.

use std::time::Duration;

use platform::rate_limit::RateLimitConfig;

use crate::domain::geo::{BoundingBox, Coordinates};

/// Melbourne CBD, used when the caller sends no coordinates
pub const DEFAULT_ORIGIN: Coordinates = Coordinates::new(-37.8136, 144.9631);

/// State of Victoria, searched when the scope is `"all"`
pub const VICTORIA: BoundingBox = BoundingBox {
    min_lng: 140.96,
    min_lat: -39.20,
    max_lng: 149.98,
    max_lat: -33.98,
};

/// Dispatch application configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Email quota per principal (3 per 60 seconds)
    pub email_rate_limit: RateLimitConfig,
    /// Origin for searches without caller coordinates
    pub default_origin: Coordinates,
    /// Area searched when scope is `"all"`
    pub wide_search_area: BoundingBox,
    pub max_location_results: usize,
    pub max_place_results: usize,
    /// Upper bound for the place-search bias circle
    pub max_place_radius_m: f64,
    /// Records returned by `emailHistory`
    pub email_history_limit: usize,
    /// Sender name when neither profile nor token has one
    pub fallback_display_name: String,
    /// Product name shown in relayed emails
    pub app_name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            email_rate_limit: RateLimitConfig::new(3, 60),
            default_origin: DEFAULT_ORIGIN,
            wide_search_area: VICTORIA,
            max_location_results: 50,
            max_place_results: 20,
            max_place_radius_m: 50_000.0,
            email_history_limit: 10,
            fallback_display_name: "User".to_string(),
            app_name: "FitTogether".to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn with_email_rate_limit(mut self, max_requests: u32, window_secs: u64) -> Self {
        self.email_rate_limit = RateLimitConfig::new(max_requests, window_secs);
        self
    }
}

/// Provider endpoints and credentials
#[derive(Clone)]
pub struct ProviderConfig {
    /// Bound on every outbound provider call
    pub timeout: Duration,
    pub user_agent: String,

    pub sendgrid_api_key: String,
    pub sendgrid_base_url: String,
    /// Verified sender identity
    pub sender_email: String,
    pub sender_name: String,

    pub geocoding_api_key: String,
    pub geocoding_base_url: String,

    pub places_api_key: String,
    pub places_base_url: String,

    pub mapbox_access_token: String,
    pub directions_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("fittogether-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
            sendgrid_api_key: String::new(),
            sendgrid_base_url: "https://api.sendgrid.com".to_string(),
            sender_email: "noreply@fittogether.app".to_string(),
            sender_name: "FitTogether".to_string(),
            geocoding_api_key: String::new(),
            geocoding_base_url: "https://us1.locationiq.com".to_string(),
            places_api_key: String::new(),
            places_base_url: "https://places.googleapis.com".to_string(),
            mapbox_access_token: String::new(),
            directions_base_url: "https://api.mapbox.com".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Point every provider at one base URL (local stubs, staging)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.sendgrid_base_url = base.clone();
        self.geocoding_base_url = base.clone();
        self.places_base_url = base.clone();
        self.directions_base_url = base;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}

// Keys are secrets; keep them out of logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("ProviderConfig")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("sendgrid_api_key", &mask(&self.sendgrid_api_key))
            .field("sendgrid_base_url", &self.sendgrid_base_url)
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("geocoding_api_key", &mask(&self.geocoding_api_key))
            .field("geocoding_base_url", &self.geocoding_base_url)
            .field("places_api_key", &mask(&self.places_api_key))
            .field("places_base_url", &self.places_base_url)
            .field("mapbox_access_token", &mask(&self.mapbox_access_token))
            .field("directions_base_url", &self.directions_base_url)
            .finish()
    }
}
