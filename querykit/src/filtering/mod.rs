//! # Filtering, Search & Sorting
//!
//! Turns a flat request parameter bag into a filtered, sorted sea-orm
//! `Select` for any entity that has a [`QueryDefinition`](crate::QueryDefinition).
//!
//! ## Main Components
//!
//! - **[`FilterType`]**: the six filter behaviours a declaration can ask for
//! - **[`extract`]**: classifies raw parameters into paging, sort, filters and ranges
//! - **[`resolve_range`]**: finds `{prefix}_start`/`start_{prefix}`/`{prefix}_min`/... bounds
//! - **[`apply`]**: the pipeline itself (filters, then ranges, then sort)
//! - **[`tokenize`]**: splits global search input into escaped tokens
//!
//! ## Query Parameter Examples
//!
//! ```text
//! // Declared filters
//! GET /tasks?status=pending&title=report
//!
//! // Ranges on a declared prefix (date -> created_at)
//! GET /tasks?date_start=2024-01-01&date_end=2024-03-31
//! GET /tasks?priority_min=2&max_priority=4
//!
//! // Global search: every token must match some column or relation
//! GET /tasks?global=quarterly report
//!
//! // Simple search: one LIKE on the name field, reduced columns
//! GET /tasks?search=quart
//!
//! // Sorting and paging
//! GET /tasks?sort_by=due_date&sort_order=asc&page=2&per_page=25
//! ```
//!
//! Unknown keys are ignored. Filters on fields that are not columns are
//! skipped, and unknown sort fields fall back to the declared default.

pub mod conditions;
pub mod extract;
pub mod filter_type;
pub mod pipeline;
pub mod range;
pub mod search;
pub mod sort;

pub use conditions::{FilterValue, is_date_field};
pub use extract::{DEFAULT_PAGE, DEFAULT_PER_PAGE, FilterParam, QueryParams, extract};
pub use filter_type::FilterType;
pub use pipeline::{Listing, apply};
pub use range::{RangeBounds, resolve_range};
pub use search::{escape_like_wildcards, tokenize};
pub use sort::{DefaultSort, SortOrder};
