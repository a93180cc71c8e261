use std::fmt;

/// How a declared request parameter is turned into a predicate.
///
/// Every filter declaration resolves to exactly one of these. Names coming
/// from configuration or other untyped sources go through
/// [`FilterType::from_name`], which treats anything it does not know as
/// [`FilterType::Exact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// `field = value`
    Exact,
    /// `field LIKE '%value%'`
    Partial,
    /// `field IN (values...)`
    In,
    /// `field >= lower AND field <= upper`
    Range,
    /// Single-field substring search with a reduced projection
    SimpleSearch,
    /// Tokenized search across columns and relations
    GlobalSearch,
}

impl FilterType {
    pub const ALL: [Self; 6] = [
        Self::Exact,
        Self::Partial,
        Self::In,
        Self::Range,
        Self::SimpleSearch,
        Self::GlobalSearch,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::In => "in",
            Self::Range => "range",
            Self::SimpleSearch => "simple_search",
            Self::GlobalSearch => "global_search",
        }
    }

    /// Parse a filter type name, falling back to `Exact` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .unwrap_or_else(|| {
                tracing::debug!(name, "unknown filter type, using exact match");
                Self::Exact
            })
    }

    /// Search filters do not target a column of their own.
    #[must_use]
    pub const fn is_search(self) -> bool {
        matches!(self, Self::SimpleSearch | Self::GlobalSearch)
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
