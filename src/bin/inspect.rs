use axum_ticketing_api::{config::AppConfig, db::create_pool};

// Quick look at what the store holds, for manual testing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;

    let tables = ["users", "categories", "events", "bookings", "reviews", "audit_logs"];

    println!("{:<12} rows", "table");
    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT count(*) FROM {table}"))
            .fetch_one(&pool)
            .await?;
        println!("{table:<12} {}", count.0);
    }

    Ok(())
}
