use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use thiserror::Error;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Debug, Error)]
pub enum DbSetupError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("failed to run database migrations: {0}")]
    Migrations(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, DbSetupError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(Pool::builder().max_size(max_size).build(manager)?)
}
