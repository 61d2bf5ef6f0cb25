//! Price-list management.

use async_trait::async_trait;
use model::Task;
use repository::TaskRepository;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::ServiceError;
use crate::validators::{valid_category, valid_name, valid_price};

#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create(&self, name: &str, price: f64, category: i32) -> Result<Task, ServiceError>;
    async fn update(&self, id: Uuid, category: i32, name: &str, price: f64) -> Result<Task, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
    async fn get_all_tasks(&self) -> Result<Vec<Task>, ServiceError>;
    async fn get_task_by_id(&self, id: Uuid) -> Result<Task, ServiceError>;
    async fn get_tasks_in_category(&self, category: i32) -> Result<Vec<Task>, ServiceError>;
    async fn get_task_by_name(&self, name: &str) -> Result<Task, ServiceError>;
}

pub struct TaskServiceImpl<T> {
    tasks_repo: T,
}

impl<T: TaskRepository> TaskServiceImpl<T> {
    pub fn new(tasks_repo: T) -> Self {
        Self { tasks_repo }
    }
}

fn validate_task(name: &str, price: f64, category: i32) -> Result<(), ServiceError> {
    if !valid_name(name) {
        return Err(ServiceError::InvalidInput("name"));
    }
    if !valid_price(price) {
        return Err(ServiceError::InvalidInput("price"));
    }
    if !valid_category(category) {
        return Err(ServiceError::InvalidInput("category"));
    }
    Ok(())
}

#[async_trait]
impl<T: TaskRepository> TaskService for TaskServiceImpl<T> {
    #[instrument(skip(self))]
    async fn create(&self, name: &str, price: f64, category: i32) -> Result<Task, ServiceError> {
        validate_task(name, price, category).inspect_err(|e| error!(error = %e, "Invalid task"))?;
        let task = self.tasks_repo.create(&Task::new(name, price, category)).await?;
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn update(&self, id: Uuid, category: i32, name: &str, price: f64) -> Result<Task, ServiceError> {
        let mut task = self.tasks_repo.get_task_by_id(id).await?;
        validate_task(name, price, category).inspect_err(|e| error!(error = %e, "Invalid task"))?;

        task.category = category;
        task.name = name.to_string();
        task.price_per_single = price;

        let task = self.tasks_repo.update(&task).await?;
        info!("Task updated");
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.tasks_repo.get_task_by_id(id).await?;
        self.tasks_repo
            .delete(id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to delete task"))?;
        info!("Task deleted");
        Ok(())
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.tasks_repo.get_all_tasks().await?)
    }

    #[instrument(skip(self))]
    async fn get_task_by_id(&self, id: Uuid) -> Result<Task, ServiceError> {
        Ok(self.tasks_repo.get_task_by_id(id).await?)
    }

    #[instrument(skip(self))]
    async fn get_tasks_in_category(&self, category: i32) -> Result<Vec<Task>, ServiceError> {
        if !valid_category(category) {
            error!("Invalid category");
            return Err(ServiceError::InvalidInput("category"));
        }
        Ok(self.tasks_repo.get_tasks_in_category(category).await?)
    }

    #[instrument(skip(self))]
    async fn get_task_by_name(&self, name: &str) -> Result<Task, ServiceError> {
        Ok(self.tasks_repo.get_task_by_name(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::InMemoryStore;

    #[tokio::test]
    async fn test_create_validates_fields() {
        let service = TaskServiceImpl::new(InMemoryStore::new().tasks());

        assert!(matches!(service.create("", 10.0, 1).await, Err(ServiceError::InvalidInput("name"))));
        assert!(matches!(service.create("Windows", 0.0, 1).await, Err(ServiceError::InvalidInput("price"))));
        assert!(matches!(service.create("Windows", 10.0, 9).await, Err(ServiceError::InvalidInput("category"))));

        let task = service.create("Windows", 10.0, 3).await.unwrap();
        assert_eq!(service.get_task_by_name("Windows").await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = TaskServiceImpl::new(InMemoryStore::new().tasks());
        let task = service.create("Windows", 10.0, 3).await.unwrap();

        let updated = service.update(task.id, 7, "Floors", 25.5).await.unwrap();
        assert_eq!((updated.category, updated.name.as_str(), updated.price_per_single), (7, "Floors", 25.5));

        let invalid = service.update(task.id, 7, "Floors", -1.0).await;
        assert!(matches!(invalid, Err(ServiceError::InvalidInput("price"))));
        assert_eq!(service.get_task_by_id(task.id).await.unwrap(), updated);

        service.delete(task.id).await.unwrap();
        assert!(service.delete(task.id).await.unwrap_err().is_not_found());
        assert!(service.update(task.id, 7, "Floors", 1.0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_tasks_in_category() {
        let service = TaskServiceImpl::new(InMemoryStore::new().tasks());
        service.create("Windows", 10.0, 3).await.unwrap();
        service.create("Balcony windows", 15.0, 3).await.unwrap();
        service.create("Floors", 20.0, 7).await.unwrap();

        let windows = service.get_tasks_in_category(3).await.unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].name, "Balcony windows");
        assert!(matches!(service.get_tasks_in_category(0).await, Err(ServiceError::InvalidInput("category"))));
        assert_eq!(service.get_all_tasks().await.unwrap().len(), 3);
    }
}
