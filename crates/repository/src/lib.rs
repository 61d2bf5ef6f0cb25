//! # Data Repository Layer
//!
//! This module provides repository traits for all booking entities: orders
//! (with their task lines), tasks, categories, users and workers.
//! Two implementations are shipped: PostgreSQL ([`postgres`]) on top of a
//! deadpool connection pool, and an in-memory store ([`memory`]) used by the
//! service tests and for local runs without a database.

use async_trait::async_trait;
use deadpool_postgres::PoolError;
use model::{Category, Order, OrderFilter, OrderedTask, Task, User, Worker};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::{
    InMemoryCategoryRepository, InMemoryOrderRepository, InMemoryStore, InMemoryTaskRepository,
    InMemoryUserRepository, InMemoryWorkerRepository,
};
pub use postgres::{
    PgCategoryRepository, PgOrderRepository, PgTaskRepository, PgUserRepository,
    PgWorkerRepository,
};

/// # RepositoryError
///
/// Error types that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database-related errors, wrapping the underlying PostgreSQL error
    #[error("Database error: {0}")]
    Db(#[from] tokio_postgres::Error),
    /// Failed to obtain a connection from the pool.
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    /// No result found.
    #[error("Not found")]
    NotFound,
    /// A unique constraint would be violated.
    #[error("Already exists: {0}")]
    Conflict(String),
    /// A stored row holds a value the model can not represent.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// # OrderRepository
///
/// Persists orders and the order-task association carrying a quantity.
///
/// `create` stores the order together with its lines atomically; `delete`
/// removes the order along with any lines still attached to it.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order, ordered_tasks: &[OrderedTask]) -> Result<Order, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn update(&self, order: &Order) -> Result<Order, RepositoryError>;
    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, RepositoryError>;
    async fn get_tasks_in_order(&self, id: Uuid) -> Result<Vec<Task>, RepositoryError>;
    /// The most recently created order of the user.
    async fn get_current_order_by_user_id(&self, user_id: Uuid) -> Result<Order, RepositoryError>;
    async fn get_all_orders_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, RepositoryError>;
    /// Attaches a task with the default quantity.
    async fn add_task_to_order(&self, order_id: Uuid, task_id: Uuid) -> Result<(), RepositoryError>;
    async fn remove_task_from_order(&self, order_id: Uuid, task_id: Uuid) -> Result<(), RepositoryError>;
    async fn update_task_quantity(&self, order_id: Uuid, task_id: Uuid, quantity: i32) -> Result<(), RepositoryError>;
    async fn get_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, RepositoryError>;
    async fn filter(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;
}

/// # TaskRepository
///
/// Price-list entries.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError>;
    async fn update(&self, task: &Task) -> Result<Task, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn get_task_by_id(&self, id: Uuid) -> Result<Task, RepositoryError>;
    async fn get_all_tasks(&self) -> Result<Vec<Task>, RepositoryError>;
    async fn get_tasks_in_category(&self, category: i32) -> Result<Vec<Task>, RepositoryError>;
    async fn get_task_by_name(&self, name: &str) -> Result<Task, RepositoryError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn get_by_id(&self, id: i32) -> Result<Category, RepositoryError>;
    async fn create(&self, name: &str) -> Result<Category, RepositoryError>;
    async fn update(&self, category: &Category) -> Result<Category, RepositoryError>;
    async fn delete(&self, id: i32) -> Result<(), RepositoryError>;
}

/// # UserRepository
///
/// Client accounts, unique by email.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, RepositoryError>;
    async fn update(&self, user: &User) -> Result<User, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<User, RepositoryError>;
    async fn get_all_users(&self) -> Result<Vec<User>, RepositoryError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;
}

/// # WorkerRepository
///
/// Staff accounts, unique by email.
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    async fn create(&self, worker: &Worker) -> Result<Worker, RepositoryError>;
    async fn update(&self, worker: &Worker) -> Result<Worker, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn get_worker_by_id(&self, id: Uuid) -> Result<Worker, RepositoryError>;
    async fn get_all_workers(&self) -> Result<Vec<Worker>, RepositoryError>;
    async fn get_worker_by_email(&self, email: &str) -> Result<Worker, RepositoryError>;
    async fn get_workers_by_role(&self, role: i32) -> Result<Vec<Worker>, RepositoryError>;
    /// Mean rate over the worker's completed, rated orders; 0 when there are none.
    async fn get_average_order_rate(&self, worker_id: Uuid) -> Result<f64, RepositoryError>;
}
