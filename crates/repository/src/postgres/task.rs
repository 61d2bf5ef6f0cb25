use async_trait::async_trait;
use model::Task;
use tokio_postgres::Row;
use uuid::Uuid;

use super::{expect_affected, map_write_error};
use crate::{RepositoryError, TaskRepository};

pg_repository!(PgTaskRepository, "PostgreSQL implementation of [`TaskRepository`].");

pub(super) fn task_from_row(row: &Row) -> Task {
    Task {
        id: row.get("id"),
        name: row.get("name"),
        price_per_single: row.get("price_per_single"),
        category: row.get("category"),
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError> {
        let query = r#"
            INSERT INTO tasks (id, name, price_per_single, category)
            VALUES ($1, $2, $3, $4)
        "#;
        let client = self.pool.get().await?;
        client
            .execute(query, &[&task.id, &task.name, &task.price_per_single, &task.category])
            .await
            .map_err(map_write_error)?;
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let query = r#"
            UPDATE tasks SET name = $1, price_per_single = $2, category = $3
            WHERE id = $4
            RETURNING id, name, price_per_single, category
        "#;
        let client = self.pool.get().await?;
        let row = client
            .query_opt(query, &[&task.name, &task.price_per_single, &task.category, &task.id])
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(task_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM tasks WHERE id = $1", &[&id]).await?;
        expect_affected(deleted)
    }

    async fn get_task_by_id(&self, id: Uuid) -> Result<Task, RepositoryError> {
        let query = "SELECT id, name, price_per_single, category FROM tasks WHERE id = $1";
        let client = self.pool.get().await?;
        let row = client.query_opt(query, &[&id]).await?;
        row.as_ref().map(task_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>, RepositoryError> {
        let query = "SELECT id, name, price_per_single, category FROM tasks ORDER BY category, name";
        let client = self.pool.get().await?;
        let rows = client.query(query, &[]).await?;
        Ok(rows.iter().map(task_from_row).collect())
    }

    async fn get_tasks_in_category(&self, category: i32) -> Result<Vec<Task>, RepositoryError> {
        let query = "SELECT id, name, price_per_single, category FROM tasks WHERE category = $1 ORDER BY name";
        let client = self.pool.get().await?;
        let rows = client.query(query, &[&category]).await?;
        Ok(rows.iter().map(task_from_row).collect())
    }

    async fn get_task_by_name(&self, name: &str) -> Result<Task, RepositoryError> {
        let query = "SELECT id, name, price_per_single, category FROM tasks WHERE name = $1 LIMIT 1";
        let client = self.pool.get().await?;
        let row = client.query_opt(query, &[&name]).await?;
        row.as_ref().map(task_from_row).ok_or(RepositoryError::NotFound)
    }
}
