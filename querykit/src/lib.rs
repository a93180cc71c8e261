//! Declarative list queries for sea-orm entities.
//!
//! Declare once per entity which request parameters filter, which prefixes
//! form ranges, what global and simple search look at and how results sort
//! by default. Every list request then goes through the same steps:
//!
//! ```rust,ignore
//! let definition = QueryDefinition::<task::Entity>::builder()
//!     .filter("status", FilterType::Exact)
//!     .filter("global", FilterType::GlobalSearch)
//!     .range("due", "due_date")
//!     .default_sort("priority", SortOrder::Desc)
//!     .global_search_columns(["title", "description"])
//!     .build()?;
//!
//! let raw = RawParams::from_query(uri.query().unwrap_or_default());
//! let (params, listing) = definition.listing(&raw);
//! let page = listing
//!     .paginate::<task::Model, _>(&db, params.page, params.per_page)
//!     .await?;
//! ```

pub mod definition;
pub mod errors;
pub mod filtering;
pub mod pagination;
pub mod params;

pub use definition::{
    FilterDefinition, FilterHook, QueryDefinition, QueryDefinitionBuilder, RangeDefinition,
    SearchRelation, SortHook,
};
pub use errors::DefinitionError;
pub use filtering::{
    DefaultSort, FilterParam, FilterType, FilterValue, Listing, QueryParams, RangeBounds,
    SortOrder, apply, escape_like_wildcards, extract, resolve_range, tokenize,
};
pub use pagination::{PaginatedResult, calculate_content_range, last_page};
pub use params::{ParamValue, RawParams};
