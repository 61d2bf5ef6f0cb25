use async_trait::async_trait;
use model::{OrderStatus, Worker};
use tokio_postgres::Row;
use uuid::Uuid;

use super::{expect_affected, map_write_error};
use crate::{RepositoryError, WorkerRepository};

pg_repository!(PgWorkerRepository, "PostgreSQL implementation of [`WorkerRepository`].");

const WORKER_COLUMNS: &str = "id, name, surname, address, phone_number, email, role, password";

fn worker_from_row(row: &Row) -> Worker {
    Worker {
        id: row.get("id"),
        name: row.get("name"),
        surname: row.get("surname"),
        address: row.get("address"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
        role: row.get("role"),
        password: row.get("password"),
    }
}

#[async_trait]
impl WorkerRepository for PgWorkerRepository {
    async fn create(&self, worker: &Worker) -> Result<Worker, RepositoryError> {
        let query = r#"
            INSERT INTO workers (id, name, surname, address, phone_number, email, role, password)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;
        let client = self.pool.get().await?;
        client.execute(query, &[
            &worker.id,
            &worker.name,
            &worker.surname,
            &worker.address,
            &worker.phone_number,
            &worker.email,
            &worker.role,
            &worker.password,
        ]).await.map_err(map_write_error)?;
        Ok(worker.clone())
    }

    async fn update(&self, worker: &Worker) -> Result<Worker, RepositoryError> {
        let query = format!(
            r#"
            UPDATE workers
            SET name = $1, surname = $2, address = $3, phone_number = $4, email = $5, role = $6, password = $7
            WHERE id = $8
            RETURNING {WORKER_COLUMNS}
            "#
        );
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[
            &worker.name,
            &worker.surname,
            &worker.address,
            &worker.phone_number,
            &worker.email,
            &worker.role,
            &worker.password,
            &worker.id,
        ]).await.map_err(map_write_error)?;
        row.as_ref().map(worker_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM workers WHERE id = $1", &[&id]).await?;
        expect_affected(deleted)
    }

    async fn get_worker_by_id(&self, id: Uuid) -> Result<Worker, RepositoryError> {
        let query = format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = $1");
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[&id]).await?;
        row.as_ref().map(worker_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn get_all_workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        let query = format!("SELECT {WORKER_COLUMNS} FROM workers ORDER BY surname, name");
        let client = self.pool.get().await?;
        let rows = client.query(query.as_str(), &[]).await?;
        Ok(rows.iter().map(worker_from_row).collect())
    }

    async fn get_worker_by_email(&self, email: &str) -> Result<Worker, RepositoryError> {
        let query = format!("SELECT {WORKER_COLUMNS} FROM workers WHERE email = $1");
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[&email]).await?;
        row.as_ref().map(worker_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn get_workers_by_role(&self, role: i32) -> Result<Vec<Worker>, RepositoryError> {
        let query = format!("SELECT {WORKER_COLUMNS} FROM workers WHERE role = $1 ORDER BY surname, name");
        let client = self.pool.get().await?;
        let rows = client.query(query.as_str(), &[&role]).await?;
        Ok(rows.iter().map(worker_from_row).collect())
    }

    async fn get_average_order_rate(&self, worker_id: Uuid) -> Result<f64, RepositoryError> {
        let query = r#"
            SELECT AVG(rate)::FLOAT8 AS average
            FROM orders
            WHERE worker_id = $1 AND status = $2 AND rate <> 0
        "#;
        let client = self.pool.get().await?;
        let row = client
            .query_one(query, &[&worker_id, &OrderStatus::Completed.code()])
            .await?;
        let average: Option<f64> = row.get("average");
        Ok(average.unwrap_or(0.0))
    }
}
