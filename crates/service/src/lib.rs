//! Business logic layer for the cleaning-service booking backend.
//!
//! Each service is an async trait with a generic `*Impl` struct wired from
//! repository implementations, so the same logic runs against PostgreSQL in
//! production and against [`repository::InMemoryStore`] in tests.
//!
//! Every operation validates its input with [`validators`], checks referenced
//! entities through the repositories, mutates an in-memory entity and
//! persists it. The first failure aborts the operation.

use repository::RepositoryError;
use thiserror::Error;

pub mod category;
pub mod hash;
pub mod order;
pub mod task;
pub mod user;
pub mod validators;
pub mod worker;

pub use category::{CategoryService, CategoryServiceImpl};
pub use hash::{Argon2Hasher, PasswordHasher};
pub use order::{OrderCommand, OrderService, OrderServiceImpl};
pub use task::{TaskService, TaskServiceImpl};
pub use user::{UserService, UserServiceImpl, UserUpdate};
pub use worker::{WorkerService, WorkerServiceImpl, WorkerUpdate};

/// The error type shared by all services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An input field failed validation; carries the field name.
    #[error("Invalid {0}")]
    InvalidInput(&'static str),
    #[error("Invalid order status")]
    InvalidStatus,
    /// A non-zero rate was given for an order that is neither completed nor cancelled.
    #[error("Order is not completed")]
    OrderNotCompleted,
    #[error("Rating is out of range")]
    RatingOutOfRange,
    #[error("Quantity can not be negative")]
    NegativeQuantity,
    #[error("Quantity is already zero")]
    QuantityAlreadyZero,
    #[error("Task is already attached to order")]
    TaskAlreadyAttached,
    #[error("Task is not attached to order")]
    TaskNotAttached,
    /// An account with this email already exists; carries the account kind.
    #[error("{0} with this email already exists")]
    AlreadyExists(&'static str),
    #[error("Wrong password")]
    WrongPassword,
    #[error("Password hashing failed: {0}")]
    Hash(String),
    /// A repository operation failed. Not-found conditions arrive here as
    /// [`RepositoryError::NotFound`].
    #[error("Database error: {0}")]
    Db(#[from] RepositoryError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Db(RepositoryError::NotFound))
    }
}
