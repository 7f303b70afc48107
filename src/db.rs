use anyhow::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tokio::fs;

const MIGRATION_LOCK_KEY: i64 = 0x7469636b6574;

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Create the sqlx pool used by the migration runner, the session store
/// and the audit log writer.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();

    // Serialize concurrent runners (several test binaries may start at once).
    // The advisory lock is transaction-scoped and released on commit.
    let txn = conn.begin().await?;
    txn.execute(Statement::from_string(
        backend,
        format!("SELECT pg_advisory_xact_lock({MIGRATION_LOCK_KEY});"),
    ))
    .await?;

    for file in files {
        let sql = fs::read_to_string(&file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let statement = format!("{stmt};");
            txn.execute(Statement::from_string(backend, statement))
                .await?;
        }
    }

    txn.commit().await?;

    Ok(())
}
