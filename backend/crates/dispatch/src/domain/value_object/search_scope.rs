use std::fmt;

/// Kilometers searched around the origin when no scope is supplied
pub const DEFAULT_SCOPE_KM: f64 = 10.0;

/// How far around the origin a search reaches
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchScope {
    /// No narrowing around the origin; a fixed wide area is used instead
    All,
    /// Radius in kilometers. Always positive and finite.
    Kilometers(f64),
}

impl Default for SearchScope {
    fn default() -> Self {
        SearchScope::Kilometers(DEFAULT_SCOPE_KM)
    }
}

impl SearchScope {
    /// Parse the `searchScope` field: `"all"` or a positive number of kilometers.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Some(SearchScope::All);
        }
        raw.parse::<f64>().ok().and_then(Self::from_km)
    }

    pub fn from_km(km: f64) -> Option<Self> {
        (km.is_finite() && km > 0.0).then_some(SearchScope::Kilometers(km))
    }

    /// Circular search radius in meters, capped at `max_meters`.
    pub fn radius_meters(&self, max_meters: f64) -> f64 {
        match self {
            SearchScope::All => max_meters,
            SearchScope::Kilometers(km) => (km * 1000.0).min(max_meters),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::All => f.write_str("all"),
            SearchScope::Kilometers(km) => write!(f, "{km}"),
        }
    }
}
