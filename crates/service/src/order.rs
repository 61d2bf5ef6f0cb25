//! Order lifecycle and line-item quantity management.
//!
//! [`OrderService`] covers order creation and deletion, the status / worker /
//! rate mutations, the task lines of an order with their quantities, and the
//! read side (lookups, filtering, total price).
//!
//! Status transitions are not ordered here: any valid status is accepted
//! whatever the current one is. Callers that want to forbid going backwards
//! can check [`OrderStatus::is_regression_from`] first.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{Order, OrderFilter, OrderStatus, OrderedTask, Task};
use repository::{OrderRepository, TaskRepository, UserRepository, WorkerRepository};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::ServiceError;
use crate::validators::{
    task_is_attached_to_order, valid_address, valid_deadline, valid_rate, valid_status,
    valid_tasks_number,
};

/// A single mutation of an order, for callers that want one entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCommand {
    ChangeStatus(OrderStatus),
    /// `None` detaches the current worker.
    AssignWorker(Option<Uuid>),
    Rate(i32),
}

/// Business operations on orders.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates a `New`, unrated order with the given task lines.
    ///
    /// # Errors
    /// [`ServiceError::InvalidInput`] for an empty address, a deadline that is
    /// not in the future, an empty task list or a non-positive quantity;
    /// [`ServiceError::Db`] with `NotFound` when a task or the user is missing.
    async fn create_order(
        &self,
        user_id: Uuid,
        address: &str,
        deadline: DateTime<Utc>,
        ordered_tasks: &[OrderedTask],
    ) -> Result<Order, ServiceError>;

    /// Detaches every task line, then deletes the order.
    async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Sets status, rate and worker in one call; `worker_id: None` detaches the worker.
    ///
    /// # Errors
    /// [`ServiceError::InvalidStatus`], [`ServiceError::OrderNotCompleted`] when
    /// a non-zero rate is given for a status other than Completed or Cancelled,
    /// [`ServiceError::RatingOutOfRange`].
    async fn update(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        rate: i32,
        worker_id: Option<Uuid>,
    ) -> Result<Order, ServiceError>;

    async fn change_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order, ServiceError>;
    async fn assign_worker(&self, order_id: Uuid, worker_id: Option<Uuid>) -> Result<Order, ServiceError>;
    /// The rate rule is checked against the stored status.
    async fn rate_order(&self, order_id: Uuid, rate: i32) -> Result<Order, ServiceError>;
    async fn apply(&self, order_id: Uuid, command: OrderCommand) -> Result<Order, ServiceError>;

    async fn get_tasks_in_order(&self, order_id: Uuid) -> Result<Vec<Task>, ServiceError>;
    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, ServiceError>;
    async fn get_current_order_by_user_id(&self, user_id: Uuid) -> Result<Order, ServiceError>;
    async fn get_all_orders_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, ServiceError>;

    async fn add_task(&self, order_id: Uuid, task_id: Uuid) -> Result<(), ServiceError>;
    async fn remove_task(&self, order_id: Uuid, task_id: Uuid) -> Result<(), ServiceError>;

    /// Returns the new quantity.
    async fn increment_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, ServiceError>;
    /// Returns the new quantity; fails with [`ServiceError::QuantityAlreadyZero`] at 0.
    async fn decrement_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, ServiceError>;
    async fn set_task_quantity(&self, order_id: Uuid, task_id: Uuid, quantity: i32) -> Result<(), ServiceError>;
    async fn get_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, ServiceError>;

    async fn filter(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError>;
    /// Sum of `price_per_single * quantity` over the order's lines; 0 without lines.
    async fn get_total_price(&self, order_id: Uuid) -> Result<f64, ServiceError>;
}

/// [`OrderService`] over the order, task, worker and user repositories.
pub struct OrderServiceImpl<O, T, W, U> {
    orders_repo: O,
    tasks_repo: T,
    workers_repo: W,
    users_repo: U,
}

impl<O, T, W, U> OrderServiceImpl<O, T, W, U>
where
    O: OrderRepository,
    T: TaskRepository,
    W: WorkerRepository,
    U: UserRepository,
{
    pub fn new(orders_repo: O, tasks_repo: T, workers_repo: W, users_repo: U) -> Self {
        Self {
            orders_repo,
            tasks_repo,
            workers_repo,
            users_repo,
        }
    }

    /// Every quantity must be positive, every task must exist and appear once.
    async fn check_tasks_existence(&self, ordered_tasks: &[OrderedTask]) -> Result<(), ServiceError> {
        let mut seen = HashSet::with_capacity(ordered_tasks.len());
        for line in ordered_tasks {
            if !seen.insert(line.task.id) {
                error!(task_id = %line.task.id, "Task is listed twice in order");
                return Err(ServiceError::InvalidInput("tasks"));
            }
            if line.quantity <= 0 {
                error!(task_id = %line.task.id, quantity = line.quantity, "Task quantity must be positive");
                return Err(ServiceError::InvalidInput("task quantity"));
            }
            self.tasks_repo.get_task_by_id(line.task.id).await.inspect_err(|e| {
                error!(task_id = %line.task.id, error = %e, "Ordered task lookup failed");
            })?;
        }
        Ok(())
    }

    /// Loads the order and checks that the task exists, in that order.
    async fn load_order_and_task(&self, order_id: Uuid, task_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.orders_repo.get_order_by_id(order_id).await?;
        self.tasks_repo.get_task_by_id(task_id).await?;
        Ok(order)
    }

    async fn save(&self, order: &Order) -> Result<Order, ServiceError> {
        let stored = self.orders_repo.update(order).await.inspect_err(|e| {
            error!(order_id = %order.id, error = %e, "Failed to update order");
        })?;
        info!(order_id = %stored.id, status = %stored.status, rate = stored.rate, "Order updated");
        Ok(stored)
    }
}

fn check_status(status: OrderStatus) -> Result<(), ServiceError> {
    if !valid_status(status) {
        error!(%status, "Invalid order status");
        return Err(ServiceError::InvalidStatus);
    }
    Ok(())
}

/// Rate must be in range and may be non-zero only on a finished order.
fn check_rate(status: OrderStatus, rate: i32) -> Result<(), ServiceError> {
    if !status.is_finished() && rate != 0 {
        error!(%status, rate, "Order is not completed");
        return Err(ServiceError::OrderNotCompleted);
    }
    if !valid_rate(rate) {
        error!(rate, "Rating is out of range");
        return Err(ServiceError::RatingOutOfRange);
    }
    Ok(())
}

#[async_trait]
impl<O, T, W, U> OrderService for OrderServiceImpl<O, T, W, U>
where
    O: OrderRepository,
    T: TaskRepository,
    W: WorkerRepository,
    U: UserRepository,
{
    #[instrument(skip(self, ordered_tasks), fields(lines = ordered_tasks.len()))]
    async fn create_order(
        &self,
        user_id: Uuid,
        address: &str,
        deadline: DateTime<Utc>,
        ordered_tasks: &[OrderedTask],
    ) -> Result<Order, ServiceError> {
        if !valid_address(address) {
            error!("Order address is empty");
            return Err(ServiceError::InvalidInput("address"));
        }
        if !valid_deadline(deadline) {
            error!(%deadline, "Order deadline is not in the future");
            return Err(ServiceError::InvalidInput("deadline"));
        }
        if !valid_tasks_number(ordered_tasks) {
            error!("Order has no tasks");
            return Err(ServiceError::InvalidInput("tasks"));
        }

        self.check_tasks_existence(ordered_tasks).await?;
        self.users_repo.get_user_by_id(user_id).await.inspect_err(|e| {
            error!(%user_id, error = %e, "Order owner lookup failed");
        })?;

        let order = Order::new(user_id, address, deadline);
        let order = self.orders_repo.create(&order, ordered_tasks).await.inspect_err(|e| {
            error!(error = %e, "Failed to create order");
        })?;

        info!(order_id = %order.id, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let order = self.orders_repo.get_order_by_id(id).await?;
        let tasks = self.orders_repo.get_tasks_in_order(order.id).await?;
        for task in &tasks {
            self.orders_repo
                .remove_task_from_order(order.id, task.id)
                .await
                .inspect_err(|e| error!(task_id = %task.id, error = %e, "Failed to detach task"))?;
        }

        self.orders_repo.delete(id).await.inspect_err(|e| {
            error!(error = %e, "Failed to delete order");
        })?;
        info!(detached = tasks.len(), "Order deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        rate: i32,
        worker_id: Option<Uuid>,
    ) -> Result<Order, ServiceError> {
        let mut order = self.orders_repo.get_order_by_id(order_id).await?;

        if let Some(worker_id) = worker_id {
            self.workers_repo.get_worker_by_id(worker_id).await.inspect_err(|e| {
                error!(%worker_id, error = %e, "Worker lookup failed");
            })?;
        }
        order.worker_id = worker_id;

        check_status(status)?;
        order.status = status;

        check_rate(status, rate)?;
        order.rate = rate;

        self.save(&order).await
    }

    #[instrument(skip(self))]
    async fn change_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order, ServiceError> {
        check_status(status)?;
        let mut order = self.orders_repo.get_order_by_id(order_id).await?;
        // A rated order can not go back to an unfinished status.
        check_rate(status, order.rate)?;
        order.status = status;
        self.save(&order).await
    }

    #[instrument(skip(self))]
    async fn assign_worker(&self, order_id: Uuid, worker_id: Option<Uuid>) -> Result<Order, ServiceError> {
        let mut order = self.orders_repo.get_order_by_id(order_id).await?;
        if let Some(worker_id) = worker_id {
            self.workers_repo.get_worker_by_id(worker_id).await?;
        }
        order.worker_id = worker_id;
        self.save(&order).await
    }

    #[instrument(skip(self))]
    async fn rate_order(&self, order_id: Uuid, rate: i32) -> Result<Order, ServiceError> {
        let mut order = self.orders_repo.get_order_by_id(order_id).await?;
        check_rate(order.status, rate)?;
        order.rate = rate;
        self.save(&order).await
    }

    async fn apply(&self, order_id: Uuid, command: OrderCommand) -> Result<Order, ServiceError> {
        match command {
            OrderCommand::ChangeStatus(status) => self.change_status(order_id, status).await,
            OrderCommand::AssignWorker(worker_id) => self.assign_worker(order_id, worker_id).await,
            OrderCommand::Rate(rate) => self.rate_order(order_id, rate).await,
        }
    }

    #[instrument(skip(self))]
    async fn get_tasks_in_order(&self, order_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        self.orders_repo.get_order_by_id(order_id).await?;
        let tasks = self.orders_repo.get_tasks_in_order(order_id).await?;
        info!(count = tasks.len(), "Loaded order tasks");
        Ok(tasks)
    }

    #[instrument(skip(self))]
    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, ServiceError> {
        Ok(self.orders_repo.get_order_by_id(id).await?)
    }

    #[instrument(skip(self))]
    async fn get_current_order_by_user_id(&self, user_id: Uuid) -> Result<Order, ServiceError> {
        self.users_repo.get_user_by_id(user_id).await?;
        Ok(self.orders_repo.get_current_order_by_user_id(user_id).await?)
    }

    #[instrument(skip(self))]
    async fn get_all_orders_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        self.users_repo.get_user_by_id(user_id).await?;
        Ok(self.orders_repo.get_all_orders_by_user_id(user_id).await?)
    }

    #[instrument(skip(self))]
    async fn add_task(&self, order_id: Uuid, task_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order_and_task(order_id, task_id).await?;
        let attached = self.orders_repo.get_tasks_in_order(order.id).await?;
        if task_is_attached_to_order(task_id, &attached) {
            error!("Task is already attached to order");
            return Err(ServiceError::TaskAlreadyAttached);
        }

        self.orders_repo.add_task_to_order(order.id, task_id).await?;
        info!("Task attached to order");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_task(&self, order_id: Uuid, task_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order_and_task(order_id, task_id).await?;
        let attached = self.orders_repo.get_tasks_in_order(order.id).await?;
        if !task_is_attached_to_order(task_id, &attached) {
            error!("Task is not attached to order");
            return Err(ServiceError::TaskNotAttached);
        }

        self.orders_repo.remove_task_from_order(order.id, task_id).await?;
        info!("Task detached from order");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, ServiceError> {
        self.load_order_and_task(order_id, task_id).await?;
        let quantity = self.orders_repo.get_task_quantity(order_id, task_id).await? + 1;
        self.orders_repo.update_task_quantity(order_id, task_id, quantity).await?;
        info!(quantity, "Task quantity incremented");
        Ok(quantity)
    }

    #[instrument(skip(self))]
    async fn decrement_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, ServiceError> {
        self.load_order_and_task(order_id, task_id).await?;
        let quantity = self.orders_repo.get_task_quantity(order_id, task_id).await?;
        if quantity == 0 {
            error!("Task quantity is already zero");
            return Err(ServiceError::QuantityAlreadyZero);
        }

        let quantity = quantity - 1;
        self.orders_repo.update_task_quantity(order_id, task_id, quantity).await?;
        info!(quantity, "Task quantity decremented");
        Ok(quantity)
    }

    #[instrument(skip(self))]
    async fn set_task_quantity(&self, order_id: Uuid, task_id: Uuid, quantity: i32) -> Result<(), ServiceError> {
        if quantity < 0 {
            error!(quantity, "Task quantity is negative");
            return Err(ServiceError::NegativeQuantity);
        }
        self.load_order_and_task(order_id, task_id).await?;
        self.orders_repo.update_task_quantity(order_id, task_id, quantity).await?;
        info!(quantity, "Task quantity set");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, ServiceError> {
        self.load_order_and_task(order_id, task_id).await?;
        Ok(self.orders_repo.get_task_quantity(order_id, task_id).await?)
    }

    #[instrument(skip(self))]
    async fn filter(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let orders = self.orders_repo.filter(filter).await.inspect_err(|e| {
            error!(error = %e, "Order filter failed");
        })?;
        info!(count = orders.len(), "Orders filtered");
        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn get_total_price(&self, order_id: Uuid) -> Result<f64, ServiceError> {
        let tasks = self.orders_repo.get_tasks_in_order(order_id).await?;
        let mut total = 0.0;
        for task in &tasks {
            let quantity = self.orders_repo.get_task_quantity(order_id, task.id).await?;
            total += task.price_per_single * f64::from(quantity);
        }
        Ok(total)
    }
}
