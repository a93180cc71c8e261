use std::collections::BTreeMap;

use super::filter_type::FilterType;
use super::range::{RangeBounds, resolve_range};
use super::sort::DefaultSort;
use crate::definition::{FilterDefinition, RangeDefinition};
use crate::params::{ParamValue, RawParams};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// One declared filter present in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParam {
    pub value: ParamValue,
    pub kind: FilterType,
}

/// Normalised pipeline input.
///
/// Maps are ordered so the same request always builds the same SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub page: u64,
    pub per_page: u64,
    pub sort_by: String,
    pub sort_order: String,
    pub filters: BTreeMap<String, FilterParam>,
    /// Backing column → bounds.
    pub range_filters: BTreeMap<String, RangeBounds>,
}

fn number(raw: &RawParams, key: &str, default: u64) -> u64 {
    raw.text(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Split a raw parameter bag into paging, sort, flat filters and ranges.
///
/// Keys that are neither declared filters nor range keys of a declared
/// prefix are ignored. Paging values are taken as given; bounding them is
/// the request validator's job.
#[must_use]
pub fn extract(
    raw: &RawParams,
    filters: &FilterDefinition,
    ranges: &RangeDefinition,
    default_sort: &DefaultSort,
) -> QueryParams {
    let flat = filters
        .iter()
        .filter_map(|(name, kind)| {
            raw.get(name)
                .filter(|value| !value.is_blank())
                .map(|value| {
                    (
                        name.clone(),
                        FilterParam {
                            value: value.clone(),
                            kind: *kind,
                        },
                    )
                })
        })
        .collect();

    let range_filters = ranges
        .iter()
        .filter_map(|(prefix, field)| {
            resolve_range(raw, prefix).map(|bounds| (field.clone(), bounds))
        })
        .collect();

    QueryParams {
        page: number(raw, "page", DEFAULT_PAGE),
        per_page: number(raw, "per_page", DEFAULT_PER_PAGE),
        sort_by: raw
            .text("sort_by")
            .map_or_else(|| default_sort.field.clone(), str::to_owned),
        sort_order: raw
            .text("sort_order")
            .map_or_else(|| default_sort.order.as_str().to_owned(), str::to_owned),
        filters: flat,
        range_filters,
    }
}
