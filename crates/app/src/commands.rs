//! Sub-command bodies, written against the service traits.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use app_config::AppConfig;
use model::{Worker, WorkerRole, category_name};
use service::{OrderService, TaskService, WorkerService};
use tracing::info;
use uuid::Uuid;

/// Creates a manager from the configured credentials when there is no manager at all.
///
/// Returns whether an account was created.
pub async fn ensure_default_admin<W: WorkerService>(workers: &W, config: &AppConfig) -> Result<bool> {
    let managers = workers.get_workers_by_role(WorkerRole::Manager.code()).await?;
    if !managers.is_empty() {
        return Ok(false);
    }

    let admin = Worker {
        id: Uuid::nil(),
        name: "admin".into(),
        surname: "admin".into(),
        address: "admin address".into(),
        phone_number: "+79999999999".into(),
        email: config.admin_email.clone(),
        role: WorkerRole::Manager.code(),
        password: String::new(),
    };
    let admin = workers.create(&admin, &config.admin_password).await?;
    info!(email = %admin.email, "Default admin created");
    Ok(true)
}

pub async fn price_list<T: TaskService>(tasks: &T) -> Result<String> {
    let tasks = tasks.get_all_tasks().await?;
    let mut out = String::new();
    let mut current = None;
    for task in &tasks {
        if current != Some(task.category) {
            current = Some(task.category);
            writeln!(out, "{}", category_name(task.category))?;
        }
        writeln!(out, "  {:<40} {:>10.2}", task.name, task.price_per_single)?;
    }
    if tasks.is_empty() {
        writeln!(out, "Price list is empty")?;
    }
    Ok(out)
}

pub async fn order_summary<O, W>(orders: &O, workers: &W, id: Uuid) -> Result<String>
where
    O: OrderService,
    W: WorkerService,
{
    let order = orders
        .get_order_by_id(id)
        .await
        .with_context(|| format!("Order {id} not found"))?;

    let worker = match order.worker_id {
        Some(worker_id) => match workers.get_worker_by_id(worker_id).await {
            Ok(worker) => worker.full_name(),
            Err(e) if e.is_not_found() => "-".to_string(),
            Err(e) => return Err(e.into()),
        },
        None => "-".to_string(),
    };

    let mut out = String::new();
    writeln!(out, "Order {}", order.id)?;
    writeln!(out, "  Status:   {}", order.status)?;
    writeln!(out, "  Address:  {}", order.address)?;
    writeln!(out, "  Deadline: {}", order.deadline.format("%Y-%m-%d %H:%M"))?;
    writeln!(out, "  Worker:   {worker}")?;
    writeln!(out, "  Rate:     {}", order.rate)?;
    for task in orders.get_tasks_in_order(order.id).await? {
        let quantity = orders.get_task_quantity(order.id, task.id).await?;
        writeln!(out, "  {:<40} {:>4} x {:>10.2}", task.name, quantity, task.price_per_single)?;
    }
    writeln!(out, "  Total:    {:.2}", orders.get_total_price(order.id).await?)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use model::{OrderedTask, Task, User};
    use repository::{InMemoryStore, InMemoryWorkerRepository, TaskRepository, UserRepository};
    use service::{Argon2Hasher, OrderServiceImpl, TaskServiceImpl, WorkerServiceImpl};

    fn config() -> AppConfig {
        AppConfig {
            db_host: "localhost".into(),
            db_port: 5432,
            db_user: "cleaning_user".into(),
            db_password: "securepassword".into(),
            db_name: "cleaning_db".into(),
            db_pool_size: 4,
            db_wait_timeout: std::time::Duration::from_secs(1),
            migrations_dir: "migrations".into(),
            log_level: "info".into(),
            admin_email: "default@admin.com".into(),
            admin_password: "admin123".into(),
        }
    }

    fn workers(store: &InMemoryStore) -> WorkerServiceImpl<InMemoryWorkerRepository, Argon2Hasher> {
        WorkerServiceImpl::new(store.workers(), Argon2Hasher)
    }

    #[tokio::test]
    async fn test_default_admin_created_once() {
        let store = InMemoryStore::new();
        let workers = workers(&store);

        assert!(ensure_default_admin(&workers, &config()).await.unwrap());
        assert!(!ensure_default_admin(&workers, &config()).await.unwrap());

        let admin = workers.login("default@admin.com", "admin123").await.unwrap();
        assert_eq!(admin.role(), Some(WorkerRole::Manager));
    }

    #[tokio::test]
    async fn test_price_list_grouped_by_category() {
        let store = InMemoryStore::new();
        store.tasks().create(&Task::new("Windows", 100.0, 3)).await.unwrap();
        store.tasks().create(&Task::new("Parquet", 80.0, 7)).await.unwrap();
        store.tasks().create(&Task::new("Balcony", 150.0, 3)).await.unwrap();

        let out = price_list(&TaskServiceImpl::new(store.tasks())).await.unwrap();
        let lines: Vec<&str> = out.lines().map(str::trim).collect();
        assert_eq!(lines[0], "Window washing");
        assert!(lines[1].starts_with("Balcony"));
        assert!(lines[2].starts_with("Windows"));
        assert_eq!(lines[3], "Hard floor care");
    }

    #[tokio::test]
    async fn test_order_summary() {
        let store = InMemoryStore::new();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ivan".into(),
            surname: "Ivanov".into(),
            address: "123 Main St".into(),
            phone_number: "+79991234567".into(),
            email: "ivan@example.com".into(),
            password: "hash".into(),
        };
        store.users().create(&user).await.unwrap();
        let task = store.tasks().create(&Task::new("Windows", 50.0, 3)).await.unwrap();

        let orders = OrderServiceImpl::new(store.orders(), store.tasks(), store.workers(), store.users());
        let order = orders
            .create_order(user.id, "123 Main St", Utc::now() + Duration::days(1), &[OrderedTask { task, quantity: 3 }])
            .await
            .unwrap();

        let out = order_summary(&orders, &workers(&store), order.id).await.unwrap();
        assert!(out.contains("Status:   New"));
        assert!(out.contains("Worker:   -"));
        assert!(out.contains("Total:    150.00"));

        assert!(order_summary(&orders, &workers(&store), Uuid::new_v4()).await.is_err());
    }
}
