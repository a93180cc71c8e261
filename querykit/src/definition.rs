//! Per-entity query declarations.
//!
//! A [`QueryDefinition`] is built once per entity and shared by every
//! request that lists it. It holds the column set (taken from the sea-orm
//! entity, never from a live schema query), the filter and range
//! declarations, the default sort, search settings and the override hooks
//! that replace generic dispatch for individual fields.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use sea_orm::{
    EntityName, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn, Select, sea_query::Order,
};

use crate::errors::DefinitionError;
use crate::filtering::{
    FilterType, FilterValue, Listing, QueryParams, extract,
    sort::{DefaultSort, SortOrder},
};
use crate::params::RawParams;

/// Request parameter name → filter behaviour.
pub type FilterDefinition = BTreeMap<String, FilterType>;

/// Range prefix (`date` in `date_start`) → backing column.
pub type RangeDefinition = BTreeMap<String, String>;

/// Replaces generic dispatch for one filter parameter.
pub type FilterHook<E> = Arc<dyn Fn(Select<E>, &FilterValue) -> Select<E> + Send + Sync>;

/// Replaces the generic `ORDER BY` for one sort field.
pub type SortHook<E> = Arc<dyn Fn(Select<E>, Order) -> Select<E> + Send + Sync>;

const DEFAULT_RANGE_PREFIX: &str = "date";
const TIMESTAMP_COLUMN: &str = "created_at";
const NAME_COLUMN: &str = "name";

/// A related table whose columns take part in global search.
///
/// Matched through `EXISTS (SELECT 1 FROM {table} AS {name} WHERE
/// {name}.{foreign_key} = main.{local_key} AND ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRelation {
    pub name: String,
    pub table: String,
    pub local_key: String,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

impl SearchRelation {
    /// The main row points at the related row (`main.{local_key} = related.id`).
    pub fn belongs_to(
        name: impl Into<String>,
        table: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            local_key: local_key.into(),
            foreign_key: "id".to_owned(),
            columns: Vec::new(),
        }
    }

    /// Related rows point back at the main row (`related.{foreign_key} = main.id`).
    pub fn has_many(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            local_key: "id".to_owned(),
            foreign_key: foreign_key.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }
}

/// Everything the engine needs to know about one entity.
pub struct QueryDefinition<E: EntityTrait> {
    table: String,
    columns: BTreeMap<String, E::Column>,
    primary_key: Vec<E::Column>,
    filters: FilterDefinition,
    ranges: RangeDefinition,
    default_sort: DefaultSort,
    global_columns: Vec<E::Column>,
    relations: Vec<SearchRelation>,
    name_field: Option<E::Column>,
    projection: Vec<E::Column>,
    filter_hooks: HashMap<String, FilterHook<E>>,
    sort_hooks: HashMap<String, SortHook<E>>,
}

impl<E: EntityTrait> QueryDefinition<E> {
    #[must_use]
    pub fn builder() -> QueryDefinitionBuilder<E> {
        QueryDefinitionBuilder::default()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<E::Column> {
        self.columns.get(name).copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    #[must_use]
    pub fn primary_key(&self) -> &[E::Column] {
        &self.primary_key
    }

    #[must_use]
    pub fn filters(&self) -> &FilterDefinition {
        &self.filters
    }

    #[must_use]
    pub fn ranges(&self) -> &RangeDefinition {
        &self.ranges
    }

    #[must_use]
    pub fn default_sort(&self) -> &DefaultSort {
        &self.default_sort
    }

    #[must_use]
    pub fn global_columns(&self) -> &[E::Column] {
        &self.global_columns
    }

    #[must_use]
    pub fn relations(&self) -> &[SearchRelation] {
        &self.relations
    }

    #[must_use]
    pub fn name_field(&self) -> Option<E::Column> {
        self.name_field
    }

    #[must_use]
    pub fn projection(&self) -> &[E::Column] {
        &self.projection
    }

    #[must_use]
    pub fn filter_hook(&self, name: &str) -> Option<&FilterHook<E>> {
        self.filter_hooks.get(name)
    }

    #[must_use]
    pub fn sort_hook(&self, name: &str) -> Option<&SortHook<E>> {
        self.sort_hooks.get(name)
    }

    /// Classify a raw parameter bag against this entity's declarations.
    #[must_use]
    pub fn extract(&self, raw: &RawParams) -> QueryParams {
        extract(raw, &self.filters, &self.ranges, &self.default_sort)
    }

    /// Filter and sort `select` according to `params`.
    #[must_use]
    pub fn apply(&self, select: Select<E>, params: &QueryParams) -> Listing<E> {
        crate::filtering::apply(select, self, params)
    }

    /// Extract and apply in one step, starting from `E::find()`.
    #[must_use]
    pub fn listing(&self, raw: &RawParams) -> (QueryParams, Listing<E>) {
        let params = self.extract(raw);
        let listing = self.apply(E::find(), &params);
        (params, listing)
    }
}

impl<E: EntityTrait> fmt::Debug for QueryDefinition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filter_hooks: Vec<_> = self.filter_hooks.keys().collect();
        filter_hooks.sort();
        let mut sort_hooks: Vec<_> = self.sort_hooks.keys().collect();
        sort_hooks.sort();

        f.debug_struct("QueryDefinition")
            .field("table", &self.table)
            .field("columns", &self.columns.keys().collect::<Vec<_>>())
            .field("filters", &self.filters)
            .field("ranges", &self.ranges)
            .field("default_sort", &self.default_sort)
            .field("relations", &self.relations)
            .field("filter_hooks", &filter_hooks)
            .field("sort_hooks", &sort_hooks)
            .finish_non_exhaustive()
    }
}

/// Collects declarations by name; names are checked against the entity in [`build`](Self::build).
pub struct QueryDefinitionBuilder<E: EntityTrait> {
    filters: FilterDefinition,
    ranges: RangeDefinition,
    default_sort: Option<DefaultSort>,
    global_columns: Vec<String>,
    relations: Vec<SearchRelation>,
    name_field: Option<String>,
    projection: Vec<String>,
    filter_hooks: HashMap<String, FilterHook<E>>,
    sort_hooks: HashMap<String, SortHook<E>>,
}

impl<E: EntityTrait> Default for QueryDefinitionBuilder<E> {
    fn default() -> Self {
        Self {
            filters: FilterDefinition::new(),
            ranges: RangeDefinition::new(),
            default_sort: None,
            global_columns: Vec::new(),
            relations: Vec::new(),
            name_field: None,
            projection: Vec::new(),
            filter_hooks: HashMap::new(),
            sort_hooks: HashMap::new(),
        }
    }
}

impl<E: EntityTrait> QueryDefinitionBuilder<E> {
    #[must_use]
    pub fn filter(mut self, name: impl Into<String>, kind: FilterType) -> Self {
        self.filters.insert(name.into(), kind);
        self
    }

    /// Declare a range prefix. Without any, `date` maps to `created_at` when the entity has one.
    #[must_use]
    pub fn range(mut self, prefix: impl Into<String>, field: impl Into<String>) -> Self {
        self.ranges.insert(prefix.into(), field.into());
        self
    }

    #[must_use]
    pub fn default_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.default_sort = Some(DefaultSort {
            field: field.into(),
            order,
        });
        self
    }

    #[must_use]
    pub fn global_search_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn search_relation(mut self, relation: SearchRelation) -> Self {
        self.relations.push(relation);
        self
    }

    /// The column simple search matches against. Defaults to `name`.
    #[must_use]
    pub fn simple_search_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = Some(field.into());
        self
    }

    /// Columns returned by simple search. Defaults to the primary key and the name field.
    #[must_use]
    pub fn projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn filter_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Select<E>, &FilterValue) -> Select<E> + Send + Sync + 'static,
    {
        self.filter_hooks.insert(name.into(), Arc::new(hook));
        self
    }

    #[must_use]
    pub fn sort_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Select<E>, Order) -> Select<E> + Send + Sync + 'static,
    {
        self.sort_hooks.insert(name.into(), Arc::new(hook));
        self
    }

    /// Resolve every declared name against the entity.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] when a declaration names something the
    /// entity does not have: a hook for an undeclared filter, a range or
    /// search column that is not a column, a default sort field with neither
    /// a column nor a sort hook, a simple search filter without a name
    /// field, or a search relation without columns.
    pub fn build(self) -> Result<QueryDefinition<E>, DefinitionError> {
        let table = E::default().table_name().to_owned();
        let columns: BTreeMap<String, E::Column> = E::Column::iter()
            .map(|column| (column.as_str().to_owned(), column))
            .collect();
        let primary_key: Vec<E::Column> = E::PrimaryKey::iter()
            .map(PrimaryKeyToColumn::into_column)
            .collect();

        let resolve = |context: String, name: &str| {
            columns
                .get(name)
                .copied()
                .ok_or_else(|| DefinitionError::UnknownColumn {
                    table: table.clone(),
                    context,
                    column: name.to_owned(),
                })
        };

        if let Some(name) = self
            .filter_hooks
            .keys()
            .find(|name| !self.filters.contains_key(*name))
        {
            return Err(DefinitionError::UndeclaredFilterHook(name.clone()));
        }

        let mut ranges = self.ranges;
        if ranges.is_empty() && columns.contains_key(TIMESTAMP_COLUMN) {
            ranges.insert(DEFAULT_RANGE_PREFIX.to_owned(), TIMESTAMP_COLUMN.to_owned());
        }
        for (prefix, field) in &ranges {
            resolve(format!("range `{prefix}`"), field)?;
        }

        let default_sort = match self.default_sort {
            Some(sort) => sort,
            None if columns.contains_key(TIMESTAMP_COLUMN) => DefaultSort {
                field: TIMESTAMP_COLUMN.to_owned(),
                order: SortOrder::Desc,
            },
            None => DefaultSort {
                field: primary_key
                    .first()
                    .map(|column| column.as_str().to_owned())
                    .unwrap_or_default(),
                order: SortOrder::Asc,
            },
        };
        if !columns.contains_key(&default_sort.field)
            && !self.sort_hooks.contains_key(&default_sort.field)
        {
            return Err(DefinitionError::UnknownSortField(default_sort.field));
        }

        let global_columns = self
            .global_columns
            .iter()
            .map(|name| resolve("global search".to_owned(), name))
            .collect::<Result<Vec<_>, _>>()?;

        for relation in &self.relations {
            if relation.columns.is_empty() {
                return Err(DefinitionError::EmptyRelation(relation.name.clone()));
            }
            resolve(format!("search relation `{}`", relation.name), &relation.local_key)?;
        }

        let name_field = match &self.name_field {
            Some(name) => Some(resolve("simple search".to_owned(), name)?),
            None => columns.get(NAME_COLUMN).copied(),
        };
        if name_field.is_none()
            && let Some((name, _)) = self
                .filters
                .iter()
                .find(|(_, kind)| **kind == FilterType::SimpleSearch)
        {
            return Err(DefinitionError::MissingNameField(name.clone()));
        }

        let projection = if self.projection.is_empty() {
            let mut projection = primary_key.clone();
            if let Some(name_field) = name_field
                && !projection.iter().any(|key| key.as_str() == name_field.as_str())
            {
                projection.push(name_field);
            }
            projection
        } else {
            self.projection
                .iter()
                .map(|name| resolve("projection".to_owned(), name))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(QueryDefinition {
            table,
            columns,
            primary_key,
            filters: self.filters,
            ranges,
            default_sort,
            global_columns,
            relations: self.relations,
            name_field,
            projection,
            filter_hooks: self.filter_hooks,
            sort_hooks: self.sort_hooks,
        })
    }
}
