//! List declarations for `GET /tasks`.

use querykit::{
    DefinitionError, FilterType, FilterValue, QueryDefinition, SearchRelation, SortOrder,
};
use sea_orm::{
    ColumnTrait, Order, QueryFilter, QueryOrder, Select,
    sea_query::{CaseStatement, Expr, SimpleExpr},
};

use crate::entities::task::{self, TaskStatus};

/// Statuses from `status=pending,completed` or `status[]=pending&status[]=completed`.
fn listed_statuses(value: &FilterValue) -> Vec<String> {
    value
        .to_list()
        .iter()
        .flat_map(|item| item.split(','))
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .map(str::to_owned)
        .collect()
}

fn status_filter(select: Select<task::Entity>, value: &FilterValue) -> Select<task::Entity> {
    let statuses = listed_statuses(value);
    if statuses.is_empty() {
        return select;
    }
    select.filter(task::Column::Status.is_in(statuses))
}

/// Workflow position of the status column; unknown statuses sort last.
fn workflow_position() -> SimpleExpr {
    TaskStatus::ALL
        .into_iter()
        .fold(CaseStatement::new(), |case, status| {
            case.case(
                task::Column::Status.eq(status.as_str()),
                Expr::val(status.position()),
            )
        })
        .finally(Expr::val(i32::MAX))
        .into()
}

fn status_order(select: Select<task::Entity>, order: Order) -> Select<task::Entity> {
    select.order_by(workflow_position(), order)
}

/// Filters, ranges, search and sort accepted by the task listing.
///
/// # Errors
///
/// Fails only if these declarations drift from the task entity.
pub fn task_definition() -> Result<QueryDefinition<task::Entity>, DefinitionError> {
    QueryDefinition::builder()
        .filter("global", FilterType::GlobalSearch)
        .filter("search", FilterType::SimpleSearch)
        .filter("status", FilterType::Exact)
        .filter("priority", FilterType::Exact)
        .filter("title", FilterType::Partial)
        .range("date", "created_at")
        .range("due", "due_date")
        .range("priority", "priority")
        .default_sort("priority", SortOrder::Desc)
        .global_search_columns(["title", "description"])
        .search_relation(
            SearchRelation::belongs_to("creator", "users", "created_by").columns(["name", "email"]),
        )
        .simple_search_field("title")
        .filter_hook("status", status_filter)
        .sort_hook("status", status_order)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use querykit::RawParams;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(query: &str) -> String {
        let definition = task_definition().unwrap();
        let (_, listing) = definition.listing(&RawParams::from_query(query));
        listing.into_select().build(DbBackend::Sqlite).to_string()
    }

    #[test]
    fn test_definition_builds() {
        let definition = task_definition().unwrap();
        assert_eq!(definition.default_sort().field, "priority");
        assert_eq!(definition.filters().len(), 5);
        assert_eq!(definition.ranges().len(), 3);
    }

    #[test]
    fn test_comma_separated_statuses() {
        assert_eq!(
            listed_statuses(&FilterValue::Text("pending, completed,".into())),
            vec!["pending", "completed"]
        );
        assert_eq!(
            listed_statuses(&FilterValue::List(vec!["pending,in_progress".into(), "cancelled".into()])),
            vec!["pending", "in_progress", "cancelled"]
        );
        let sql = sql("status=pending,completed");
        assert!(sql.contains(r#""tasks"."status" IN ('pending', 'completed')"#), "{sql}");
    }

    #[test]
    fn test_status_sort_follows_workflow() {
        let sql = sql("sort_by=status&sort_order=asc");
        assert!(sql.contains("CASE WHEN"), "{sql}");
        assert!(sql.contains("ELSE 2147483647"), "{sql}");
        assert!(sql.ends_with(r#""tasks"."id" ASC"#), "{sql}");
    }

    #[test]
    fn test_creator_relation_is_searched() {
        let sql = sql("global=ada");
        assert!(sql.contains(r#"FROM "users" AS "creator""#), "{sql}");
        assert!(sql.contains(r#""creator"."id" = "tasks"."created_by""#), "{sql}");
    }
}
