use crate::domain::errors::RepoError;

pub mod models;
pub mod order_repo;
pub mod product_repo;
pub mod transactor;

#[cfg(test)]
pub(crate) mod memory;
#[cfg(test)]
pub(crate) mod test_support;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for RepoError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match e {
            Error::NotFound => RepoError::NotFound,
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepoError::UniqueViolation(info.message().to_string())
            }
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                RepoError::ForeignKeyViolation(info.message().to_string())
            }
            other => RepoError::Backend(Box::new(other)),
        }
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(e: r2d2::Error) -> Self {
        RepoError::Backend(Box::new(e))
    }
}
