//! Shared fixtures for unit and integration tests.

use sqlx::SqlitePool;

/// Creates an in-memory SQLite database with migrations applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Inserts a row into the source table.
pub async fn insert_person(pool: &SqlitePool, id: i64, profile_url: Option<&str>) {
    sqlx::query("INSERT INTO people (id, profile_url) VALUES (?, ?)")
        .bind(id)
        .bind(profile_url)
        .execute(pool)
        .await
        .expect("Failed to insert person");
}

/// Number of output rows written for an entity.
pub async fn credit_count(pool: &SqlitePool, entity_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM filmography WHERE entity_id = ?")
        .bind(entity_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count credits")
}

/// Builders for profile pages and `__NEXT_DATA__` payloads.
pub mod mocks {
    use serde_json::{json, Value};

    /// A profile page embedding `raw` verbatim as the structured-data block.
    pub fn page_with_raw_payload(raw: &str) -> String {
        format!(
            r#"
            <html>
                <head><title>Profile</title></head>
                <body>
                    <h1>Profile</h1>
                    <script id="__NEXT_DATA__" type="application/json">{}</script>
                </body>
            </html>
            "#,
            raw
        )
    }

    pub fn page_with_payload(payload: &Value) -> String {
        page_with_raw_payload(&payload.to_string())
    }

    /// A page with markup but no structured-data block.
    pub fn page_without_payload() -> String {
        r#"
        <html>
            <head><title>Profile</title></head>
            <body><p>Nothing embedded here.</p></body>
        </html>
        "#
        .to_string()
    }

    /// Payload with a released group and, when given, an unreleased group.
    pub fn credits_payload(released: Vec<Value>, unreleased: Option<Vec<Value>>) -> Value {
        let mut main = json!({ "released": { "edges": released } });
        if let Some(unreleased) = unreleased {
            main["unreleased"] = json!({ "edges": unreleased });
        }
        json!({ "props": { "pageProps": { "mainColumnData": main } } })
    }

    /// Edge carrying nothing but a title text.
    pub fn title_edge(title: &str) -> Value {
        json!({ "node": { "title": { "titleText": { "text": title } } } })
    }

    /// Fully populated released movie edge.
    pub fn movie_edge(title: &str, id: &str, year: i64, character: &str) -> Value {
        json!({
            "node": {
                "title": {
                    "id": id,
                    "titleText": { "text": title },
                    "releaseYear": { "year": year },
                    "titleType": { "text": "Movie" }
                },
                "characters": [{ "name": character }]
            }
        })
    }
}
