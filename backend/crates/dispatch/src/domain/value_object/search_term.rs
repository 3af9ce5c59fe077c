/// What a location or place search looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Free-text query typed by the caller
    Query(String),
    /// Category picked from a list (gym, park, ...)
    LocationType(String),
}

impl SearchTerm {
    /// Pick the search text. A non-blank query wins over a location type.
    pub fn resolve(query: Option<&str>, location_type: Option<&str>) -> Option<Self> {
        if let Some(q) = non_blank(query) {
            return Some(SearchTerm::Query(q.to_string()));
        }
        non_blank(location_type).map(|t| SearchTerm::LocationType(t.to_string()))
    }

    pub fn text(&self) -> &str {
        match self {
            SearchTerm::Query(s) | SearchTerm::LocationType(s) => s,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
