use async_trait::async_trait;
use model::Category;
use tokio_postgres::Row;

use super::{expect_affected, map_write_error};
use crate::{CategoryRepository, RepositoryError};

pg_repository!(PgCategoryRepository, "PostgreSQL implementation of [`CategoryRepository`].");

fn category_from_row(row: &Row) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn get_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let client = self.pool.get().await?;
        let rows = client.query("SELECT id, name FROM categories ORDER BY id", &[]).await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn get_by_id(&self, id: i32) -> Result<Category, RepositoryError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT id, name FROM categories WHERE id = $1", &[&id])
            .await?;
        row.as_ref().map(category_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn create(&self, name: &str) -> Result<Category, RepositoryError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("INSERT INTO categories (name) VALUES ($1) RETURNING id, name", &[&name])
            .await
            .map_err(map_write_error)?;
        Ok(category_from_row(&row))
    }

    async fn update(&self, category: &Category) -> Result<Category, RepositoryError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name",
                &[&category.name, &category.id],
            )
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(category_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM categories WHERE id = $1", &[&id]).await?;
        expect_affected(deleted)
    }
}
