#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use querykit::{
    FilterType, FilterValue, PaginatedResult, QueryDefinition, RawParams, SearchRelation,
    SortOrder,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Schema, Set,
};

pub mod article;
pub mod author;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(&schema.create_table_from_entity(author::Entity)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(article::Entity)))
        .await?;

    Ok(db)
}

struct Seed {
    title: &'static str,
    body: Option<&'static str>,
    status: &'static str,
    priority: i32,
    author_id: Option<i32>,
    published: bool,
    created_at: (i32, u32, u32, u32),
    due_date: Option<(i32, u32, u32)>,
}

/// Two authors and five articles; article ids follow insertion order (1..=5).
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;

    for (name, email) in [
        ("Ada Lovelace", "ada@example.com"),
        ("Grace Hopper", "grace@example.com"),
    ] {
        author::ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }

    let seeds = [
        Seed {
            title: "Project Alpha kickoff",
            body: Some("Planning the alpha"),
            status: "done",
            priority: 5,
            author_id: Some(1),
            published: true,
            created_at: (2024, 1, 1, 23),
            due_date: Some((2024, 2, 1)),
        },
        Seed {
            title: "Project Beta",
            body: None,
            status: "draft",
            priority: 3,
            author_id: Some(2),
            published: false,
            created_at: (2024, 1, 15, 8),
            due_date: Some((2024, 3, 1)),
        },
        Seed {
            title: "100% done report",
            body: Some("Quarterly numbers"),
            status: "done",
            priority: 3,
            author_id: Some(2),
            published: true,
            created_at: (2024, 2, 10, 12),
            due_date: None,
        },
        Seed {
            title: "1000 done items",
            body: Some("Archive"),
            status: "archived",
            priority: 1,
            author_id: None,
            published: false,
            created_at: (2024, 3, 5, 9),
            due_date: Some((2024, 3, 10)),
        },
        Seed {
            title: "Alpha retrospective",
            body: Some("What went well"),
            status: "review",
            priority: 4,
            author_id: Some(1),
            published: true,
            created_at: (2024, 3, 20, 18),
            due_date: Some((2024, 4, 1)),
        },
    ];

    for seed in seeds {
        let (year, month, day, hour) = seed.created_at;
        article::ActiveModel {
            title: Set(seed.title.to_owned()),
            body: Set(seed.body.map(str::to_owned)),
            status: Set(seed.status.to_owned()),
            priority: Set(seed.priority),
            author_id: Set(seed.author_id),
            published: Set(seed.published),
            created_at: Set(Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()),
            due_date: Set(seed
                .due_date
                .map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }

    Ok(db)
}

fn base_builder() -> querykit::QueryDefinitionBuilder<article::Entity> {
    QueryDefinition::<article::Entity>::builder()
        .filter("global", FilterType::GlobalSearch)
        .filter("search", FilterType::SimpleSearch)
        .filter("status", FilterType::Exact)
        .filter("published", FilterType::Exact)
        .filter("title", FilterType::Partial)
        .filter("priority", FilterType::In)
        .filter("created_at", FilterType::Range)
        .filter("legacy", FilterType::Exact)
        .range("date", "created_at")
        .range("due", "due_date")
        .range("priority", "priority")
        .default_sort("priority", SortOrder::Desc)
        .global_search_columns(["title", "body"])
        .search_relation(
            SearchRelation::belongs_to("author", "authors", "author_id").columns(["name", "email"]),
        )
        .simple_search_field("title")
}

/// Article declarations without any hooks.
pub fn article_definition() -> QueryDefinition<article::Entity> {
    base_builder().build().unwrap()
}

/// Article declarations where `status` takes a comma separated list and
/// `recent` sorts by creation time.
pub fn hooked_article_definition() -> QueryDefinition<article::Entity> {
    base_builder()
        .filter_hook("status", |select, value: &FilterValue| {
            let statuses: Vec<String> = value
                .to_list()
                .iter()
                .flat_map(|item| item.split(','))
                .map(|status| status.trim().to_owned())
                .filter(|status| !status.is_empty())
                .collect();
            select.filter(article::Column::Status.is_in(statuses))
        })
        .sort_hook("recent", |select, order| {
            select.order_by(article::Column::CreatedAt, order)
        })
        .build()
        .unwrap()
}

pub async fn list(
    db: &DatabaseConnection,
    definition: &QueryDefinition<article::Entity>,
    query: &str,
) -> PaginatedResult<article::Model> {
    let (params, listing) = definition.listing(&RawParams::from_query(query));
    listing
        .paginate::<article::Model, _>(db, params.page, params.per_page)
        .await
        .unwrap()
}

pub fn ids(result: &PaginatedResult<article::Model>) -> Vec<i32> {
    result.items.iter().map(|article| article.id).collect()
}

pub async fn all_articles(db: &DatabaseConnection) -> Vec<article::Model> {
    article::Entity::find().all(db).await.unwrap()
}
