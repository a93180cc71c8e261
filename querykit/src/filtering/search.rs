use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Select,
    sea_query::{Alias, Expr, Func, LikeExpr, Query, SimpleExpr},
};

use crate::definition::{QueryDefinition, SearchRelation};

/// Escape LIKE wildcards so they match literally.
/// Escapes: \ (the escape character itself), % (match any) and _ (match single char)
#[must_use]
pub fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\") // Escape backslash first
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `%value%` with `\` declared as the escape character.
pub(crate) fn contains_pattern(escaped: &str) -> LikeExpr {
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

fn lower_like(expr: impl Into<SimpleExpr>, escaped: &str) -> SimpleExpr {
    Expr::expr(Func::lower(expr)).like(contains_pattern(escaped))
}

/// Split free text into search tokens.
///
/// The value is lower-cased and whitespace-collapsed, then split on every
/// run of characters that are neither letters nor digits (Unicode aware).
/// Each token comes back escaped for use inside a LIKE pattern.
///
/// ```
/// assert_eq!(querykit::tokenize("  foo   bar-baz  "), vec!["foo", "bar", "baz"]);
/// assert!(querykit::tokenize(" -- ").is_empty());
/// ```
#[must_use]
pub fn tokenize(value: &str) -> Vec<String> {
    let normalized = value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(escape_like_wildcards)
        .collect()
}

fn relation_match(main_table: &str, relation: &SearchRelation, token: &str) -> SimpleExpr {
    let alias = Alias::new(&relation.name);
    let any_column = relation
        .columns
        .iter()
        .fold(Condition::any(), |any, column| {
            any.add(lower_like(
                Expr::col((alias.clone(), Alias::new(column))),
                token,
            ))
        });

    let joined = Expr::col((alias.clone(), Alias::new(&relation.foreign_key)))
        .equals((Alias::new(main_table), Alias::new(&relation.local_key)));

    Expr::exists(
        Query::select()
            .expr(Expr::val(1))
            .from_as(Alias::new(&relation.table), alias)
            .cond_where(Condition::all().add(joined).add(any_column))
            .to_owned(),
    )
}

/// AND over tokens of an OR across every searchable column and relation.
///
/// `None` when there are no tokens or nothing is declared searchable.
pub(crate) fn global_search_condition<E: EntityTrait>(
    definition: &QueryDefinition<E>,
    tokens: &[String],
) -> Option<Condition> {
    if tokens.is_empty()
        || (definition.global_columns().is_empty() && definition.relations().is_empty())
    {
        return None;
    }

    let condition = tokens.iter().fold(Condition::all(), |all, token| {
        let columns = definition
            .global_columns()
            .iter()
            .map(|column| lower_like(Expr::col(column.as_column_ref()), token));
        let relations = definition
            .relations()
            .iter()
            .map(|relation| relation_match(definition.table(), relation, token));

        all.add(columns.chain(relations).fold(Condition::any(), Condition::add))
    });
    Some(condition)
}

/// Narrow the projection and match `name` against `value`, untokenized.
pub(crate) fn simple_search<E: EntityTrait>(
    select: Select<E>,
    definition: &QueryDefinition<E>,
    name: E::Column,
    value: &str,
) -> Select<E> {
    let escaped = escape_like_wildcards(&value.to_lowercase());

    select
        .select_only()
        .columns(definition.projection().iter().copied())
        .filter(lower_like(Expr::col(name.as_column_ref()), &escaped))
}
