use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing profile for directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Cycling,
    Driving,
}

impl TravelMode {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use TravelMode::*;
        match self {
            Walking => "walking",
            Cycling => "cycling",
            Driving => "driving",
        }
    }

    /// Resolve a caller-supplied mode. Anything unrecognised becomes walking.
    pub fn coerce(raw: Option<&str>) -> Self {
        match raw {
            Some("cycling") => TravelMode::Cycling,
            Some("driving") => TravelMode::Driving,
            _ => TravelMode::Walking,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
