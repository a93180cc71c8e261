use std::fmt;

use sea_orm::{EntityTrait, IdenStatic, QueryOrder, Select, sea_query::Order};

use crate::definition::QueryDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Case-insensitive `asc`/`desc`; anything else is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

/// The sort used when a request does not name one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSort {
    pub field: String,
    pub order: SortOrder,
}

/// Order `select` by `sort_by`, then by primary key for a stable result.
///
/// A registered sort hook wins over a column of the same name. A field that
/// is neither falls back to the declared default sort, and an order other
/// than `asc`/`desc` falls back to the declared default order.
pub(crate) fn apply_sort<E: EntityTrait>(
    select: Select<E>,
    definition: &QueryDefinition<E>,
    sort_by: &str,
    sort_order: &str,
) -> Select<E> {
    let default = definition.default_sort();
    let order = SortOrder::parse(sort_order).unwrap_or_else(|| {
        tracing::debug!(sort_order, fallback = %default.order, "unrecognised sort order");
        default.order
    });

    let field = if definition.sort_hook(sort_by).is_some() || definition.column(sort_by).is_some()
    {
        sort_by
    } else {
        tracing::debug!(sort_by, fallback = %default.field, "unknown sort field");
        default.field.as_str()
    };

    let mut select = if let Some(hook) = definition.sort_hook(field) {
        tracing::trace!(field, "applying sort hook");
        hook(select, order.into())
    } else if let Some(column) = definition.column(field) {
        select.order_by(column, order.into())
    } else {
        select
    };

    for key in definition.primary_key() {
        if key.as_str() != field {
            select = select.order_by(*key, Order::Asc);
        }
    }

    select
}
