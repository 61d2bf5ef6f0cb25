//! In-memory repositories backed by one shared, thread-safe table set.
//!
//! [`InMemoryStore`] owns the tables; the per-entity handles returned by
//! [`InMemoryStore::orders`], [`InMemoryStore::tasks`] and friends are cheap
//! clones that see each other's writes, so an order can join against tasks
//! the same way the SQL implementation does.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use model::{
    Category, DEFAULT_TASK_QUANTITY, Order, OrderFilter, OrderStatus, OrderedTask, Task, User, Worker,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    CategoryRepository, OrderRepository, RepositoryError, TaskRepository, UserRepository,
    WorkerRepository,
};

#[derive(Debug, Clone)]
struct OrderLine {
    order_id: Uuid,
    task_id: Uuid,
    quantity: i32,
}

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<Uuid, Order>,
    /// Kept in insertion order.
    order_lines: Vec<OrderLine>,
    tasks: HashMap<Uuid, Task>,
    categories: BTreeMap<i32, Category>,
    last_category_id: i32,
    users: HashMap<Uuid, User>,
    workers: HashMap<Uuid, Worker>,
}

impl Tables {
    fn line_mut(&mut self, order_id: Uuid, task_id: Uuid) -> Option<&mut OrderLine> {
        self.order_lines
            .iter_mut()
            .find(|l| l.order_id == order_id && l.task_id == task_id)
    }
}

/// Thread-safe in-memory storage shared by all in-memory repositories.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> InMemoryOrderRepository {
        InMemoryOrderRepository { store: self.clone() }
    }

    pub fn tasks(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository { store: self.clone() }
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository { store: self.clone() }
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository { store: self.clone() }
    }

    pub fn workers(&self) -> InMemoryWorkerRepository {
        InMemoryWorkerRepository { store: self.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryOrderRepository {
    store: InMemoryStore,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order, ordered_tasks: &[OrderedTask]) -> Result<Order, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict(format!("order {}", order.id)));
        }
        let mut seen = HashSet::with_capacity(ordered_tasks.len());
        if let Some(line) = ordered_tasks.iter().find(|line| !seen.insert(line.task.id)) {
            return Err(RepositoryError::Conflict(format!(
                "task {} in order {}",
                line.task.id, order.id
            )));
        }
        tables.orders.insert(order.id, order.clone());
        tables
            .order_lines
            .extend(ordered_tasks.iter().map(|line| OrderLine {
                order_id: order.id,
                task_id: line.task.id,
                quantity: line.quantity,
            }));
        Ok(order.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.orders.remove(&id).ok_or(RepositoryError::NotFound)?;
        tables.order_lines.retain(|l| l.order_id != id);
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        let stored = tables.orders.get_mut(&order.id).ok_or(RepositoryError::NotFound)?;
        *stored = Order {
            creation_date: stored.creation_date,
            ..order.clone()
        };
        Ok(stored.clone())
    }

    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables.orders.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_tasks_in_order(&self, id: Uuid) -> Result<Vec<Task>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut tasks: Vec<Task> = tables
            .order_lines
            .iter()
            .filter(|l| l.order_id == id)
            .filter_map(|l| tables.tasks.get(&l.task_id).cloned())
            .collect();
        tasks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tasks)
    }

    async fn get_current_order_by_user_id(&self, user_id: Uuid) -> Result<Order, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .max_by_key(|o| o.creation_date)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_all_orders_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.creation_date);
        Ok(orders)
    }

    async fn add_task_to_order(&self, order_id: Uuid, task_id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        if tables.line_mut(order_id, task_id).is_some() {
            return Err(RepositoryError::Conflict(format!("task {task_id} in order {order_id}")));
        }
        tables.order_lines.push(OrderLine {
            order_id,
            task_id,
            quantity: DEFAULT_TASK_QUANTITY,
        });
        Ok(())
    }

    async fn remove_task_from_order(&self, order_id: Uuid, task_id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables
            .order_lines
            .retain(|l| !(l.order_id == order_id && l.task_id == task_id));
        Ok(())
    }

    async fn update_task_quantity(&self, order_id: Uuid, task_id: Uuid, quantity: i32) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        let line = tables.line_mut(order_id, task_id).ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    async fn get_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables
            .order_lines
            .iter()
            .find(|l| l.order_id == order_id && l.task_id == task_id)
            .map(|l| l.quantity)
            .ok_or(RepositoryError::NotFound)
    }

    async fn filter(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.creation_date);
        Ok(orders)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    store: InMemoryStore,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        let stored = tables.tasks.get_mut(&task.id).ok_or(RepositoryError::NotFound)?;
        *stored = task.clone();
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.tasks.remove(&id).ok_or(RepositoryError::NotFound)?;
        tables.order_lines.retain(|l| l.task_id != id);
        Ok(())
    }

    async fn get_task_by_id(&self, id: Uuid) -> Result<Task, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables.tasks.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut tasks: Vec<Task> = tables.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(tasks)
    }

    async fn get_tasks_in_category(&self, category: i32) -> Result<Vec<Task>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.category == category)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tasks)
    }

    async fn get_task_by_name(&self, name: &str) -> Result<Task, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables
            .tasks
            .values()
            .find(|t| t.name == name)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCategoryRepository {
    store: InMemoryStore,
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn get_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.store.inner.read().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> Result<Category, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables.categories.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn create(&self, name: &str) -> Result<Category, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.last_category_id += 1;
        let category = Category {
            id: tables.last_category_id,
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: &Category) -> Result<Category, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        let stored = tables
            .categories
            .get_mut(&category.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.name = category.name.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.categories.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    store: InMemoryStore,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!("email {}", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(RepositoryError::Conflict(format!("email {}", user.email)));
        }
        let stored = tables.users.get_mut(&user.id).ok_or(RepositoryError::NotFound)?;
        *stored = user.clone();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.users.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables.users.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_all_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| (&a.surname, &a.name).cmp(&(&b.surname, &b.name)));
        Ok(users)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryWorkerRepository {
    store: InMemoryStore,
}

#[async_trait]
impl WorkerRepository for InMemoryWorkerRepository {
    async fn create(&self, worker: &Worker) -> Result<Worker, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        if tables.workers.values().any(|w| w.email == worker.email) {
            return Err(RepositoryError::Conflict(format!("email {}", worker.email)));
        }
        tables.workers.insert(worker.id, worker.clone());
        Ok(worker.clone())
    }

    async fn update(&self, worker: &Worker) -> Result<Worker, RepositoryError> {
        let mut tables = self.store.inner.write().await;
        if tables
            .workers
            .values()
            .any(|w| w.email == worker.email && w.id != worker.id)
        {
            return Err(RepositoryError::Conflict(format!("email {}", worker.email)));
        }
        let stored = tables.workers.get_mut(&worker.id).ok_or(RepositoryError::NotFound)?;
        *stored = worker.clone();
        Ok(worker.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.store.inner.write().await;
        tables.workers.remove(&id).ok_or(RepositoryError::NotFound)?;
        // Mirrors `ON DELETE SET NULL` on orders.worker_id.
        for order in tables.orders.values_mut() {
            if order.worker_id == Some(id) {
                order.worker_id = None;
            }
        }
        Ok(())
    }

    async fn get_worker_by_id(&self, id: Uuid) -> Result<Worker, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables.workers.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_all_workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut workers: Vec<Worker> = tables.workers.values().cloned().collect();
        workers.sort_by(|a, b| (&a.surname, &a.name).cmp(&(&b.surname, &b.name)));
        Ok(workers)
    }

    async fn get_worker_by_email(&self, email: &str) -> Result<Worker, RepositoryError> {
        let tables = self.store.inner.read().await;
        tables
            .workers
            .values()
            .find(|w| w.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_workers_by_role(&self, role: i32) -> Result<Vec<Worker>, RepositoryError> {
        let tables = self.store.inner.read().await;
        let mut workers: Vec<Worker> = tables
            .workers
            .values()
            .filter(|w| w.role == role)
            .cloned()
            .collect();
        workers.sort_by(|a, b| (&a.surname, &a.name).cmp(&(&b.surname, &b.name)));
        Ok(workers)
    }

    async fn get_average_order_rate(&self, worker_id: Uuid) -> Result<f64, RepositoryError> {
        let tables = self.store.inner.read().await;
        let rates: Vec<i32> = tables
            .orders
            .values()
            .filter(|o| {
                o.worker_id == Some(worker_id) && o.status == OrderStatus::Completed && o.rate != 0
            })
            .map(|o| o.rate)
            .collect();
        if rates.is_empty() {
            return Ok(0.0);
        }
        Ok(rates.iter().map(|&r| f64::from(r)).sum::<f64>() / rates.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_order(user_id: Uuid) -> Order {
        Order::new(user_id, "Street 1", Utc::now() + Duration::days(2))
    }

    #[tokio::test]
    async fn test_order_lines_join_tasks() {
        let store = InMemoryStore::new();
        let tasks = store.tasks();
        let orders = store.orders();

        let windows = tasks.create(&Task::new("Windows", 100.0, 3)).await.unwrap();
        let floors = tasks.create(&Task::new("Floors", 200.0, 7)).await.unwrap();

        let order = sample_order(Uuid::new_v4());
        let lines = vec![
            OrderedTask { task: windows.clone(), quantity: 2 },
            OrderedTask { task: floors.clone(), quantity: 1 },
        ];
        orders.create(&order, &lines).await.unwrap();

        let attached = orders.get_tasks_in_order(order.id).await.unwrap();
        assert_eq!(attached, vec![floors, windows.clone()]);
        assert_eq!(orders.get_task_quantity(order.id, windows.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_repeated_task() {
        let store = InMemoryStore::new();
        let task = store.tasks().create(&Task::new("Windows", 100.0, 3)).await.unwrap();
        let orders = store.orders();
        let order = sample_order(Uuid::new_v4());
        let lines = [
            OrderedTask { task: task.clone(), quantity: 2 },
            OrderedTask { task: task.clone(), quantity: 3 },
        ];

        assert!(matches!(orders.create(&order, &lines).await, Err(RepositoryError::Conflict(_))));
        assert!(matches!(orders.get_order_by_id(order.id).await, Err(RepositoryError::NotFound)));
        assert!(matches!(
            orders.get_task_quantity(order.id, task.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_order_drops_lines() {
        let store = InMemoryStore::new();
        let task = store.tasks().create(&Task::new("Carpet", 50.0, 6)).await.unwrap();
        let orders = store.orders();
        let order = sample_order(Uuid::new_v4());
        orders
            .create(&order, &[OrderedTask { task: task.clone(), quantity: 1 }])
            .await
            .unwrap();

        orders.delete(order.id).await.unwrap();
        assert!(matches!(
            orders.get_task_quantity(order.id, task.id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(orders.delete(order.id).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_keeps_creation_date() {
        let store = InMemoryStore::new();
        let orders = store.orders();
        let order = sample_order(Uuid::new_v4());
        orders.create(&order, &[]).await.unwrap();

        let mut changed = order.clone();
        changed.creation_date = Utc::now() + Duration::days(10);
        changed.status = OrderStatus::InProgress;
        let stored = orders.update(&changed).await.unwrap();
        assert_eq!(stored.creation_date, order.creation_date);
        assert_eq!(stored.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_current_order_is_latest() {
        let store = InMemoryStore::new();
        let orders = store.orders();
        let user = Uuid::new_v4();
        let mut older = sample_order(user);
        older.creation_date = Utc::now() - Duration::days(3);
        let newer = sample_order(user);
        orders.create(&older, &[]).await.unwrap();
        orders.create(&newer, &[]).await.unwrap();

        assert_eq!(orders.get_current_order_by_user_id(user).await.unwrap().id, newer.id);
        assert_eq!(orders.get_all_orders_by_user_id(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        let users = store.users();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ivan".into(),
            surname: "Ivanov".into(),
            address: "Street 2".into(),
            phone_number: "+79991234567".into(),
            email: "ivan@example.com".into(),
            password: "hash".into(),
        };
        users.create(&user).await.unwrap();
        let twin = User { id: Uuid::new_v4(), ..user };
        assert!(matches!(users.create(&twin).await, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_category_ids_increase() {
        let store = InMemoryStore::new();
        let categories = store.categories();
        let first = categories.create("Windows").await.unwrap();
        let second = categories.create("Floors").await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(categories.get_all().await.unwrap(), vec![first, second]);
    }
}
