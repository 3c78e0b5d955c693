pub mod models;
pub mod repository;

pub use models::*;
pub use repository::*;

/// In-memory SQLite pool with all migrations applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        // every connection to `sqlite::memory:` is its own database
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}
