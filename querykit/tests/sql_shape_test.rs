mod common;

use common::{article_definition, hooked_article_definition};
use querykit::RawParams;
use sea_orm::{DbBackend, QueryTrait};

fn sql(query: &str) -> String {
    let definition = article_definition();
    let (_, listing) = definition.listing(&RawParams::from_query(query));
    listing.into_select().build(DbBackend::Postgres).to_string()
}

#[test]
fn test_end_to_end_statement() {
    let statement = sql(
        "status=done&global=proj+alpha&date_start=2024-01-01&page=1&per_page=10&sort_by=priority&sort_order=desc",
    );

    assert!(statement.contains(r#""articles"."status" = 'done'"#), "{statement}");
    assert!(statement.contains(r#"LOWER("articles"."title") LIKE '%proj%'"#), "{statement}");
    assert!(statement.contains(r#"LOWER("articles"."body") LIKE '%alpha%'"#), "{statement}");
    assert!(statement.contains(r#"FROM "authors" AS "author""#), "{statement}");
    assert!(statement.contains(r#""author"."id" = "articles"."author_id""#), "{statement}");
    assert!(statement.contains(r#"LOWER("author"."email") LIKE '%alpha%'"#), "{statement}");
    assert!(statement.contains(r#"DATE("articles"."created_at") >= '2024-01-01'"#), "{statement}");
    assert!(statement.contains("ESCAPE"), "{statement}");
    assert!(
        statement.ends_with(r#"ORDER BY "articles"."priority" DESC, "articles"."id" ASC"#),
        "{statement}"
    );
}

#[test]
fn test_unknown_keys_do_not_change_the_statement() {
    assert_eq!(sql("legacy=x&unknown=y&sort_by=priority"), sql(""));
}

#[test]
fn test_empty_range_values_do_not_change_the_statement() {
    assert_eq!(sql("date_start=&date_end="), sql(""));
}

#[test]
fn test_numeric_range_binds_numbers() {
    let statement = sql("priority_min=2&priority_max=4");
    assert!(statement.contains(r#""articles"."priority" >= 2"#), "{statement}");
    assert!(statement.contains(r#""articles"."priority" <= 4"#), "{statement}");
}

#[test]
fn test_sorting_by_primary_key_skips_tie_break() {
    let statement = sql("sort_by=id&sort_order=asc");
    assert!(statement.ends_with(r#"ORDER BY "articles"."id" ASC"#), "{statement}");
}

#[test]
fn test_simple_search_narrows_projection() {
    let statement = sql("search=alp");
    assert!(
        statement.starts_with(r#"SELECT "articles"."id", "articles"."title" FROM "articles""#),
        "{statement}"
    );
    assert!(statement.contains(r#"LOWER("articles"."title") LIKE '%alp%'"#), "{statement}");
}

#[test]
fn test_sort_hook_takes_precedence() {
    let definition = hooked_article_definition();
    let (_, listing) = definition.listing(&RawParams::from_query("sort_by=recent&sort_order=asc"));
    let statement = listing.into_select().build(DbBackend::Postgres).to_string();

    assert!(
        statement.ends_with(r#"ORDER BY "articles"."created_at" ASC, "articles"."id" ASC"#),
        "{statement}"
    );
}
