use crate::params::RawParams;

/// Bounds resolved for one range prefix.
///
/// Date-style keys (`start`/`end`) and numeric-style keys (`min`/`max`) are
/// kept apart so callers can tell which naming the client used. Either side
/// may be missing, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeBounds {
    Dates {
        start: Option<String>,
        end: Option<String>,
    },
    Numbers {
        min: Option<String>,
        max: Option<String>,
    },
}

impl RangeBounds {
    #[must_use]
    pub fn lower(&self) -> Option<&str> {
        match self {
            Self::Dates { start, .. } => start.as_deref(),
            Self::Numbers { min, .. } => min.as_deref(),
        }
    }

    #[must_use]
    pub fn upper(&self) -> Option<&str> {
        match self {
            Self::Dates { end, .. } => end.as_deref(),
            Self::Numbers { max, .. } => max.as_deref(),
        }
    }

    /// Drop blank sides. Returns `None` when nothing is left.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        fn keep(side: Option<&String>) -> Option<String> {
            side.map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        }

        let normalized = match self {
            Self::Dates { start, end } => Self::Dates {
                start: keep(start.as_ref()),
                end: keep(end.as_ref()),
            },
            Self::Numbers { min, max } => Self::Numbers {
                min: keep(min.as_ref()),
                max: keep(max.as_ref()),
            },
        };
        (normalized.lower().is_some() || normalized.upper().is_some()).then_some(normalized)
    }
}

/// Look up one side of a range under its suffix form first, then its prefix form.
fn side<'a>(raw: &'a RawParams, prefix: &str, word: &str) -> Option<&'a str> {
    raw.text(&format!("{prefix}_{word}"))
        .or_else(|| raw.text(&format!("{word}_{prefix}")))
}

/// Resolve the range bounds a request gives for `prefix`.
///
/// Lookup order is `{prefix}_start`/`{prefix}_end`, then `start_{prefix}`/
/// `end_{prefix}` (each side falls back on its own). Only when neither a
/// start nor an end turns up are `{prefix}_min`/`{prefix}_max` and then
/// `min_{prefix}`/`max_{prefix}` consulted. Blank values count as absent.
///
/// ```
/// use querykit::{RangeBounds, RawParams, resolve_range};
///
/// let raw: RawParams = [("date_end", "2024-01-01"), ("date_min", "3")].into_iter().collect();
/// assert_eq!(
///     resolve_range(&raw, "date"),
///     Some(RangeBounds::Dates { start: None, end: Some("2024-01-01".into()) })
/// );
/// ```
#[must_use]
pub fn resolve_range(raw: &RawParams, prefix: &str) -> Option<RangeBounds> {
    let start = side(raw, prefix, "start");
    let end = side(raw, prefix, "end");
    if start.is_some() || end.is_some() {
        return Some(RangeBounds::Dates {
            start: start.map(str::to_owned),
            end: end.map(str::to_owned),
        });
    }

    let min = side(raw, prefix, "min");
    let max = side(raw, prefix, "max");
    if min.is_some() || max.is_some() {
        return Some(RangeBounds::Numbers {
            min: min.map(str::to_owned),
            max: max.map(str::to_owned),
        });
    }

    None
}
