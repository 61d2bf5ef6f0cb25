//! Task categories and the listing of tasks per category.

use async_trait::async_trait;
use model::{Category, Task};
use repository::{CategoryRepository, TaskRepository};
use tracing::{error, info, instrument};

use crate::ServiceError;

#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Category>, ServiceError>;
    async fn get_by_id(&self, id: i32) -> Result<Category, ServiceError>;
    async fn create(&self, name: &str) -> Result<Category, ServiceError>;
    async fn update(&self, category: &Category) -> Result<Category, ServiceError>;
    async fn delete(&self, id: i32) -> Result<(), ServiceError>;
    async fn get_tasks_in_category(&self, id: i32) -> Result<Vec<Task>, ServiceError>;
}

pub struct CategoryServiceImpl<C, T> {
    categories_repo: C,
    tasks_repo: T,
}

impl<C, T> CategoryServiceImpl<C, T>
where
    C: CategoryRepository,
    T: TaskRepository,
{
    pub fn new(categories_repo: C, tasks_repo: T) -> Self {
        Self { categories_repo, tasks_repo }
    }
}

#[async_trait]
impl<C, T> CategoryService for CategoryServiceImpl<C, T>
where
    C: CategoryRepository,
    T: TaskRepository,
{
    async fn get_all(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.categories_repo.get_all().await?)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Category, ServiceError> {
        Ok(self.categories_repo.get_by_id(id).await?)
    }

    #[instrument(skip(self))]
    async fn create(&self, name: &str) -> Result<Category, ServiceError> {
        let category = self
            .categories_repo
            .create(name)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create category"))?;
        info!(category_id = category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self))]
    async fn update(&self, category: &Category) -> Result<Category, ServiceError> {
        Ok(self
            .categories_repo
            .update(category)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to update category"))?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        Ok(self
            .categories_repo
            .delete(id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to delete category"))?)
    }

    #[instrument(skip(self))]
    async fn get_tasks_in_category(&self, id: i32) -> Result<Vec<Task>, ServiceError> {
        Ok(self.tasks_repo.get_tasks_in_category(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::InMemoryStore;

    #[tokio::test]
    async fn test_category_crud() {
        let store = InMemoryStore::new();
        let service = CategoryServiceImpl::new(store.categories(), store.tasks());

        let created = service.create("Window washing").await.unwrap();
        let renamed = Category { name: "Windows".into(), ..created.clone() };
        assert_eq!(service.update(&renamed).await.unwrap(), renamed);
        assert_eq!(service.get_by_id(created.id).await.unwrap(), renamed);
        assert_eq!(service.get_all().await.unwrap().len(), 1);

        service.delete(created.id).await.unwrap();
        assert!(service.get_by_id(created.id).await.unwrap_err().is_not_found());
        assert!(service.delete(created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_tasks_in_category() {
        let store = InMemoryStore::new();
        store.tasks().create(&Task::new("Windows", 10.0, 3)).await.unwrap();
        let service = CategoryServiceImpl::new(store.categories(), store.tasks());
        assert_eq!(service.get_tasks_in_category(3).await.unwrap().len(), 1);
        assert!(service.get_tasks_in_category(4).await.unwrap().is_empty());
    }
}
