use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, Select,
};

use super::conditions::{self, FilterValue};
use super::filter_type::FilterType;
use super::extract::QueryParams;
use super::search::{global_search_condition, simple_search, tokenize};
use super::sort::apply_sort;
use crate::definition::QueryDefinition;
use crate::pagination::PaginatedResult;

/// A filtered and sorted query, not yet paginated.
#[derive(Debug, Clone)]
pub struct Listing<E: EntityTrait> {
    select: Select<E>,
    projected: bool,
}

impl<E: EntityTrait> Listing<E> {
    /// True when simple search narrowed the selected columns.
    #[must_use]
    pub fn is_projected(&self) -> bool {
        self.projected
    }

    #[must_use]
    pub fn select(&self) -> &Select<E> {
        &self.select
    }

    #[must_use]
    pub fn into_select(self) -> Select<E> {
        self.select
    }

    /// Count the matches and fetch one page of them as `M`.
    ///
    /// `M` is the entity model for a full listing, or any `FromQueryResult`
    /// type covering the projection when simple search was applied. A page
    /// or page size of 0 is read as 1. A page past the last one is empty and
    /// skips the page query.
    ///
    /// # Errors
    ///
    /// Propagates any [`DbErr`] from the count or page query unchanged.
    pub async fn paginate<'db, M, C>(
        self,
        db: &'db C,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResult<M>, DbErr>
    where
        M: FromQueryResult + Send + Sync + 'db,
        C: ConnectionTrait,
    {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let paginator = self.select.into_model::<M>().paginate(db, per_page);
        let total = paginator.num_items().await?;

        let in_range = (page - 1)
            .checked_mul(per_page)
            .is_some_and(|offset| offset < total);
        if !in_range {
            return Ok(PaginatedResult::new(Vec::new(), total, page, per_page));
        }
        let items = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResult::new(items, total, page, per_page))
    }
}

fn apply_filter<E: EntityTrait>(
    select: Select<E>,
    definition: &QueryDefinition<E>,
    field: &str,
    kind: FilterType,
    value: &FilterValue,
    projected: &mut bool,
) -> Select<E> {
    match kind {
        FilterType::GlobalSearch => {
            let text = value.to_list().join(" ");
            match global_search_condition(definition, &tokenize(&text)) {
                Some(condition) => select.filter(condition),
                None => select,
            }
        }
        FilterType::SimpleSearch => {
            let Some(name) = definition.name_field() else {
                tracing::debug!(field, "no name field for simple search");
                return select;
            };
            *projected = true;
            simple_search(select, definition, name, &value.to_list().join(" "))
        }
        FilterType::Exact | FilterType::Partial | FilterType::In | FilterType::Range => {
            let Some(column) = definition.column(field) else {
                tracing::debug!(field, kind = %kind, "skipping filter on unknown column");
                return select;
            };
            match kind {
                FilterType::Partial => match conditions::partial(column, value) {
                    Some(expr) => select.filter(expr),
                    None => select,
                },
                FilterType::In => select.filter(conditions::membership(column, value)),
                FilterType::Range => match conditions::range_from_value(column, value) {
                    Some(condition) => select.filter(condition),
                    None => select,
                },
                _ => select.filter(conditions::exact(column, value)),
            }
        }
    }
}

/// Run the query pipeline: declared filters, then ranges, then sort.
///
/// Each flat filter is normalised first (blank values skipped, `"true"`/
/// `"false"` made boolean). A registered filter hook replaces generic
/// dispatch for its field. Filters and ranges on fields that are not
/// columns are skipped rather than reported.
#[must_use]
pub fn apply<E: EntityTrait>(
    mut select: Select<E>,
    definition: &QueryDefinition<E>,
    params: &QueryParams,
) -> Listing<E> {
    let mut projected = false;

    for (field, filter) in &params.filters {
        let Some(value) = FilterValue::normalize(&filter.value) else {
            continue;
        };

        select = if let Some(hook) = definition.filter_hook(field) {
            tracing::trace!(field, "applying filter hook");
            hook(select, &value)
        } else {
            apply_filter(select, definition, field, filter.kind, &value, &mut projected)
        };
    }

    for (field, bounds) in &params.range_filters {
        let Some(bounds) = bounds.normalized() else {
            continue;
        };
        let Some(column) = definition.column(field) else {
            tracing::debug!(field, "skipping range on unknown column");
            continue;
        };
        if let Some(condition) = conditions::range(column, bounds.lower(), bounds.upper()) {
            select = select.filter(condition);
        }
    }

    let select = apply_sort(select, definition, &params.sort_by, &params.sort_order);
    Listing { select, projected }
}
