//! PostgreSQL implementations of the repository traits.
//!
//! Every repository holds a clone of the same deadpool pool and checks a
//! connection out per call. Tables are created by `migrations/0001_init.sql`.

use tokio_postgres::error::SqlState;

use crate::RepositoryError;

/// Shared struct/constructor shape for the PostgreSQL repositories.
macro_rules! pg_repository {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone)]
        pub struct $name {
            pool: deadpool_postgres::Pool,
        }

        impl $name {
            pub fn new(pool: deadpool_postgres::Pool) -> Self {
                Self { pool }
            }
        }
    };
}

mod category;
mod order;
mod task;
mod user;
mod worker;

pub use category::PgCategoryRepository;
pub use order::PgOrderRepository;
pub use task::PgTaskRepository;
pub use user::PgUserRepository;
pub use worker::PgWorkerRepository;

/// Maps unique-constraint violations to [`RepositoryError::Conflict`].
fn map_write_error(err: tokio_postgres::Error) -> RepositoryError {
    match err.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
            let detail = err
                .as_db_error()
                .and_then(|db| db.detail().map(str::to_string))
                .unwrap_or_else(|| err.to_string());
            RepositoryError::Conflict(detail)
        }
        _ => RepositoryError::Db(err),
    }
}

/// Turns a zero affected-rows count into [`RepositoryError::NotFound`].
fn expect_affected(rows: u64) -> Result<(), RepositoryError> {
    if rows == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}
