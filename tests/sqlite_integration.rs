//! Integration tests for plucking from SQLite.
//!
//! These tests verify that association trees load end to end against a
//! real database, including join tables and scoped associations.

use deep_pluck::MemoryStore;
use deep_pluck::prelude::*;
use deep_pluck::sqlite::{SqliteConfig, SqliteConnection};
use pretty_assertions::assert_eq;

const SCHEMA_SQL: &str = r#"
    CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id), title TEXT);
    CREATE TABLE post_comments (id INTEGER PRIMARY KEY, post_id INTEGER REFERENCES posts(id), comment TEXT);
    CREATE TABLE achievements (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE user_achievements (user_id INTEGER, achievement_id INTEGER);

    INSERT INTO users VALUES (1, 'alice'), (2, 'bob'), (3, 'carol');
    INSERT INTO posts VALUES (1, 1, 'post1'), (2, 1, 'post2'), (3, 2, 'post3');
    INSERT INTO post_comments VALUES (1, 1, 'nice'), (2, 1, 'great'), (3, 3, 'meh');
    INSERT INTO achievements VALUES (1, 'first'), (2, 'second');
    INSERT INTO user_achievements VALUES (1, 1), (1, 2), (2, 2);
"#;

fn schema() -> Schema {
    Schema::new()
        .entity(
            EntitySpec::new("User", "users")
                .association(AssociationSpec::has_many("posts", "Post"))
                .association(
                    AssociationSpec::has_many("odd_posts", "Post").scope(Filter::or([
                        Filter::ends_with("title", "1"),
                        Filter::ends_with("title", "3"),
                    ])),
                )
                .association(AssociationSpec::has_many("user_achievements", "UserAchievement"))
                .association(
                    AssociationSpec::has_many("achievements", "Achievement")
                        .through("user_achievements"),
                ),
        )
        .entity(
            EntitySpec::new("Post", "posts")
                .association(AssociationSpec::belongs_to("user", "User"))
                .association(AssociationSpec::has_many("post_comments", "PostComment")),
        )
        .entity(EntitySpec::new("PostComment", "post_comments"))
        .entity(
            EntitySpec::new("UserAchievement", "user_achievements")
                .association(AssociationSpec::belongs_to("achievement", "Achievement")),
        )
        .entity(EntitySpec::new("Achievement", "achievements"))
}

async fn seeded() -> SqliteConnection {
    let conn = SqliteConnection::memory().await.unwrap();
    conn.execute_batch(SCHEMA_SQL).await.unwrap();
    conn
}

fn sorted(mut rows: Vec<Row>, field: &str) -> Vec<Row> {
    rows.sort_by_key(|row| row.get(field).and_then(Value::as_str).map(str::to_string));
    rows
}

/// Test a two-level tree loaded from SQLite
#[tokio::test]
async fn test_two_level_tree() {
    let schema = schema();
    let conn = seeded().await;

    let rows = Pluck::new(conn.relation("User", "users"), &schema)
        .add(
            PluckSpec::from("name")
                .and(("posts", PluckSpec::from("title").and(("post_comments", "comment")))),
        )
        .unwrap()
        .load_all()
        .await
        .unwrap();
    let rows = sorted(rows, "name");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], Value::from("alice"));
    let alice_posts = sorted(rows[0].many("posts").unwrap().to_vec(), "title");
    assert_eq!(alice_posts.len(), 2);
    assert_eq!(
        sorted(alice_posts[0].many("post_comments").unwrap().to_vec(), "comment"),
        vec![row! { "comment" => "great" }, row! { "comment" => "nice" }]
    );
    assert_eq!(alice_posts[1], row! { "title" => "post2", "post_comments" => Vec::<Row>::new() });
    assert_eq!(
        rows[1],
        row! {
            "name" => "bob",
            "posts" => vec![row! {
                "title" => "post3",
                "post_comments" => vec![row! { "comment" => "meh" }],
            }],
        }
    );
    assert_eq!(rows[2], row! { "name" => "carol", "posts" => Vec::<Row>::new() });
}

/// Test the reverse direction with qualified column names
#[tokio::test]
async fn test_belongs_to_with_qualified_columns() {
    let schema = schema();
    let conn = seeded().await;

    let rows = Pluck::new(conn.relation("Post", "posts"), &schema)
        .add(PluckSpec::from("posts.title").and(("user", "\"users\".\"name\"")))
        .unwrap()
        .load_all()
        .await
        .unwrap();
    let rows = sorted(rows, "title");

    assert_eq!(
        rows,
        vec![
            row! { "title" => "post1", "user" => row! { "name" => "alice" } },
            row! { "title" => "post2", "user" => row! { "name" => "alice" } },
            row! { "title" => "post3", "user" => row! { "name" => "bob" } },
        ]
    );
}

/// Test a scoped association rendered as SQL
#[tokio::test]
async fn test_scoped_association() {
    let schema = schema();
    let conn = seeded().await;

    let rows = Pluck::new(conn.relation("User", "users"), &schema)
        .add(("odd_posts", "title"))
        .unwrap()
        .load_all_with(|users| users.apply_scope(&Filter::equals("name", "alice")))
        .await
        .unwrap();

    assert_eq!(rows, vec![row! { "odd_posts" => vec![row! { "title" => "post1" }] }]);
}

/// Test has_many :through against a real join
#[tokio::test]
async fn test_has_many_through() {
    let schema = schema();
    let conn = seeded().await;

    let rows = Pluck::new(conn.relation("User", "users"), &schema)
        .add(PluckSpec::from("name").and(("achievements", "name")))
        .unwrap()
        .load_all()
        .await
        .unwrap();
    let rows = sorted(rows, "name");

    let alice = sorted(rows[0].many("achievements").unwrap().to_vec(), "name");
    assert_eq!(alice, vec![row! { "name" => "first" }, row! { "name" => "second" }]);
    assert_eq!(rows[1].many("achievements").unwrap(), &[row! { "name" => "second" }]);
    assert!(rows[2].many("achievements").unwrap().is_empty());
}

/// Test batching against SQLite
#[tokio::test]
async fn test_batched_load() {
    let schema = schema();
    let conn = seeded().await;

    let rows = Pluck::new(conn.relation("User", "users"), &schema)
        .with_config(PluckConfig::new().with_batch_size(1))
        .add(PluckSpec::from("name").and(("posts", "title")))
        .unwrap()
        .load_all()
        .await
        .unwrap();
    let rows = sorted(rows, "name");

    assert_eq!(rows[1], row! { "name" => "bob", "posts" => vec![row! { "title" => "post3" }] });
    assert_eq!(rows[0].many("posts").unwrap().len(), 2);
}

/// Test that an unknown column surfaces as a database error with its SQL
#[tokio::test]
async fn test_unknown_column_fails() {
    let schema = schema();
    let conn = seeded().await;

    let err = Pluck::new(conn.relation("User", "users"), &schema)
        .add(("posts", "subtitle"))
        .unwrap()
        .load_all()
        .await
        .unwrap_err();

    assert!(err.is_database_error());
    assert_eq!(err.context.entity.as_deref(), Some("Post"));
    assert!(err.context.sql.as_deref().is_some_and(|sql| sql.contains("subtitle")));
}

/// Test loading from a file database opened by URL
#[tokio::test]
async fn test_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pluck.db");

    let conn = SqliteConnection::open(SqliteConfig::file(&path)).await.unwrap();
    conn.execute_batch(SCHEMA_SQL).await.unwrap();

    let url = format!("sqlite://{}", path.display());
    let reopened = SqliteConnection::from_url(&url).await.unwrap();
    let schema = schema();
    let rows = Pluck::new(reopened.relation("User", "users"), &schema)
        .add(("posts", "title"))
        .unwrap()
        .load_all_with(|users| users.apply_scope(&Filter::equals("name", "bob")))
        .await
        .unwrap();

    assert_eq!(rows, vec![row! { "posts" => vec![row! { "title" => "post3" }] }]);
}

fn ids(rows: Vec<Row>) -> Vec<i64> {
    let mut ids: Vec<i64> = rows.iter().filter_map(|row| row["id"].as_i64()).collect();
    ids.sort();
    ids
}

/// Test that scopes select the same rows from SQLite and from the memory store
#[tokio::test]
async fn test_scopes_agree_with_memory_store() {
    let conn = SqliteConnection::memory().await.unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE notes (id INTEGER PRIMARY KEY, kind TEXT, title TEXT);
        INSERT INTO notes VALUES
            (1, NULL, 'post one'), (2, 'primary', 'POST TWO'),
            (3, 'other', '50% off'), (4, 'other', '50 off');
    "#,
    )
    .await
    .unwrap();

    let store = MemoryStore::new();
    store.insert_many(
        "notes",
        vec![
            row! { "id" => 1, "kind" => None::<String>, "title" => "post one" },
            row! { "id" => 2, "kind" => "primary", "title" => "POST TWO" },
            row! { "id" => 3, "kind" => "other", "title" => "50% off" },
            row! { "id" => 4, "kind" => "other", "title" => "50 off" },
        ],
    );
    let schema = Schema::new().entity(EntitySpec::new("Note", "notes"));

    let cases = vec![
        (Filter::not(Filter::equals("kind", "primary")), vec![3, 4]),
        (Filter::ends_with("title", "ONE"), vec![1]),
        (Filter::starts_with("title", "post"), vec![1, 2]),
        (Filter::contains("title", "0%"), vec![3]),
        (Filter::or([Filter::IsNull("kind".into()), Filter::contains("title", "_")]), vec![1]),
    ];

    for (scope, expected) in cases {
        let from_sqlite = Pluck::new(conn.relation("Note", "notes"), &schema)
            .add("id")
            .unwrap()
            .load_all_with(|notes| notes.apply_scope(&scope))
            .await
            .unwrap();
        let from_memory = Pluck::new(store.relation("Note", "notes"), &schema)
            .add("id")
            .unwrap()
            .load_all_with(|notes| notes.apply_scope(&scope))
            .await
            .unwrap();

        assert_eq!(ids(from_sqlite), expected, "sqlite: {:?}", scope);
        assert_eq!(ids(from_memory), expected, "memory: {:?}", scope);
    }
}
