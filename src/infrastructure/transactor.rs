use diesel::pg::PgConnection;

use crate::db::DbPool;
use crate::domain::errors::{DomainError, RepoError};
use crate::domain::ports::Transactor;

/// Runs each unit of work on its own pooled connection inside a
/// `READ COMMITTED` transaction.
#[derive(Clone)]
pub struct PgTransactor {
    pool: DbPool,
}

impl PgTransactor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Keeps the caller's error apart from failures of BEGIN/COMMIT/ROLLBACK,
/// which diesel reports through the same channel.
enum TxError {
    Domain(DomainError),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(e: diesel::result::Error) -> Self {
        TxError::Diesel(e)
    }
}

impl Transactor for PgTransactor {
    type Conn = PgConnection;

    fn transaction<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut PgConnection) -> Result<R, DomainError>,
    {
        let mut conn = self.pool.get().map_err(|e| DomainError::Database {
            operation: "AcquireConnection",
            source: RepoError::from(e),
        })?;

        conn.build_transaction()
            .read_committed()
            .run::<R, TxError, _>(|conn| f(conn).map_err(TxError::Domain))
            .map_err(|e| match e {
                TxError::Domain(e) => e,
                TxError::Diesel(e) => DomainError::Transaction(RepoError::from(e)),
            })
    }
}
