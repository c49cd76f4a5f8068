use sqlx::Row;

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Some(url);
        }
    }

    // Build from POSTGRES_* (same as app config)
    let server = std::env::var("POSTGRES_SERVER").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "examforge".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "examforge_db".into());

    Some(format!("postgresql://{user}:{password}@{server}:{port}/{db}"))
}

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    // Same opt-in switch as the in-crate database tests.
    if !matches!(
        std::env::var("EXAMFORGE_TEST_DB").as_deref(),
        Ok("1") | Ok("true") | Ok("yes") | Ok("on")
    ) {
        eprintln!("skipped: set EXAMFORGE_TEST_DB=1 with a local Postgres running");
        return Ok(());
    }

    let database_url = match database_url() {
        Some(url) => url,
        None => {
            anyhow::bail!("DATABASE_URL and POSTGRES_* are not set");
        }
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new("migrations")).await?;
    migrator.run(&pool).await?;

    let tables = [
        "users",
        "categories",
        "exams",
        "questions",
        "question_options",
        "exam_attempts",
        "user_answers",
    ];

    for table in tables {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = $1",
        )
        .bind(table)
        .fetch_one(&pool)
        .await?;
        let count: i64 = row.get("count");
        assert_eq!(count, 1, "table {table} missing after migrations");
    }

    // The role enum backs users.role.
    let row = sqlx::query("SELECT COUNT(*) AS count FROM pg_type WHERE typname = 'userrole'")
        .fetch_one(&pool)
        .await?;
    let count: i64 = row.get("count");
    assert_eq!(count, 1, "userrole enum missing");

    Ok(())
}
