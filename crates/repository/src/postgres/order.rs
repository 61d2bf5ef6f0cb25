use async_trait::async_trait;
use model::{DEFAULT_TASK_QUANTITY, Order, OrderFilter, OrderStatus, OrderedTask, RefFilter, Task};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use super::{expect_affected, map_write_error};
use crate::{OrderRepository, RepositoryError};

pg_repository!(
    PgOrderRepository,
    "PostgreSQL implementation of [`OrderRepository`] over the `orders` and `order_contains_tasks` tables."
);

const ORDER_COLUMNS: &str = "id, worker_id, user_id, status, address, creation_date, deadline, rate";

fn status_from_code(code: i32) -> Result<OrderStatus, RepositoryError> {
    OrderStatus::from_code(code).ok_or_else(|| RepositoryError::InvalidData(format!("order status {code}")))
}

fn order_from_row(row: &Row) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: row.get("id"),
        worker_id: row.get("worker_id"),
        user_id: row.get("user_id"),
        status: status_from_code(row.get("status"))?,
        address: row.get("address"),
        creation_date: row.get("creation_date"),
        deadline: row.get("deadline"),
        rate: row.get("rate"),
    })
}

type SqlParams = Vec<Box<dyn ToSql + Sync + Send>>;

fn ref_condition(column: &str, filter: &RefFilter, params: &mut SqlParams) -> String {
    match filter {
        RefFilter::Null => format!("{column} IS NULL"),
        RefFilter::NotNull => format!("{column} IS NOT NULL"),
        RefFilter::AnyOf { ids, or_null } => {
            params.push(Box::new(ids.clone()));
            let any = format!("{column} = ANY(${})", params.len());
            if *or_null {
                format!("({any} OR {column} IS NULL)")
            } else {
                any
            }
        }
    }
}

/// Compiles the filter into a parameterised query.
fn filter_query(filter: &OrderFilter) -> (String, SqlParams) {
    let mut conditions = Vec::new();
    let mut params: SqlParams = Vec::new();

    if !filter.statuses.is_empty() {
        let codes: Vec<i32> = filter.statuses.iter().map(|s| s.code()).collect();
        params.push(Box::new(codes));
        conditions.push(format!("status = ANY(${})", params.len()));
    }
    if let Some(worker) = &filter.worker {
        conditions.push(ref_condition("worker_id", worker, &mut params));
    }
    if let Some(user) = &filter.user {
        conditions.push(ref_condition("user_id", user, &mut params));
    }

    let mut query = format!("SELECT {ORDER_COLUMNS} FROM orders");
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    query.push_str(" ORDER BY creation_date");
    (query, params)
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: &Order, ordered_tasks: &[OrderedTask]) -> Result<Order, RepositoryError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let query = r#"
            INSERT INTO orders (id, worker_id, user_id, status, address, creation_date, deadline, rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;
        tx.execute(query, &[
            &order.id,
            &order.worker_id,
            &order.user_id,
            &order.status.code(),
            &order.address,
            &order.creation_date,
            &order.deadline,
            &order.rate,
        ]).await.map_err(map_write_error)?;

        let line_query = r#"
            INSERT INTO order_contains_tasks (order_id, task_id, quantity)
            VALUES ($1, $2, $3)
        "#;
        for line in ordered_tasks {
            tx.execute(line_query, &[&order.id, &line.task.id, &line.quantity])
                .await
                .map_err(map_write_error)?;
        }

        tx.commit().await?;
        Ok(order.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        tx.execute("DELETE FROM order_contains_tasks WHERE order_id = $1", &[&id]).await?;
        let deleted = tx.execute("DELETE FROM orders WHERE id = $1", &[&id]).await?;
        expect_affected(deleted)?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        let query = format!(
            r#"
            UPDATE orders
            SET worker_id = $1, user_id = $2, status = $3, address = $4, deadline = $5, rate = $6
            WHERE id = $7
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[
            &order.worker_id,
            &order.user_id,
            &order.status.code(),
            &order.address,
            &order.deadline,
            &order.rate,
            &order.id,
        ]).await?;
        row.as_ref().map(order_from_row).transpose()?.ok_or(RepositoryError::NotFound)
    }

    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, RepositoryError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[&id]).await?;
        row.as_ref().map(order_from_row).transpose()?.ok_or(RepositoryError::NotFound)
    }

    async fn get_tasks_in_order(&self, id: Uuid) -> Result<Vec<Task>, RepositoryError> {
        let query = r#"
            SELECT t.id, t.name, t.price_per_single, t.category
            FROM tasks t
            JOIN order_contains_tasks oct ON oct.task_id = t.id
            WHERE oct.order_id = $1
            ORDER BY t.name
        "#;
        let client = self.pool.get().await?;
        let rows = client.query(query, &[&id]).await?;
        Ok(rows.iter().map(super::task::task_from_row).collect())
    }

    async fn get_current_order_by_user_id(&self, user_id: Uuid) -> Result<Order, RepositoryError> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY creation_date DESC LIMIT 1"
        );
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[&user_id]).await?;
        row.as_ref().map(order_from_row).transpose()?.ok_or(RepositoryError::NotFound)
    }

    async fn get_all_orders_by_user_id(&self, user_id: Uuid) -> Result<Vec<Order>, RepositoryError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY creation_date");
        let client = self.pool.get().await?;
        let rows = client.query(query.as_str(), &[&user_id]).await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn add_task_to_order(&self, order_id: Uuid, task_id: Uuid) -> Result<(), RepositoryError> {
        let query = "INSERT INTO order_contains_tasks (order_id, task_id, quantity) VALUES ($1, $2, $3)";
        let client = self.pool.get().await?;
        client
            .execute(query, &[&order_id, &task_id, &DEFAULT_TASK_QUANTITY])
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn remove_task_from_order(&self, order_id: Uuid, task_id: Uuid) -> Result<(), RepositoryError> {
        let query = "DELETE FROM order_contains_tasks WHERE order_id = $1 AND task_id = $2";
        let client = self.pool.get().await?;
        client.execute(query, &[&order_id, &task_id]).await?;
        Ok(())
    }

    async fn update_task_quantity(&self, order_id: Uuid, task_id: Uuid, quantity: i32) -> Result<(), RepositoryError> {
        let query = "UPDATE order_contains_tasks SET quantity = $1 WHERE order_id = $2 AND task_id = $3";
        let client = self.pool.get().await?;
        let updated = client.execute(query, &[&quantity, &order_id, &task_id]).await?;
        expect_affected(updated)
    }

    async fn get_task_quantity(&self, order_id: Uuid, task_id: Uuid) -> Result<i32, RepositoryError> {
        let query = "SELECT quantity FROM order_contains_tasks WHERE order_id = $1 AND task_id = $2";
        let client = self.pool.get().await?;
        let row = client.query_opt(query, &[&order_id, &task_id]).await?;
        row.map(|r| r.get("quantity")).ok_or(RepositoryError::NotFound)
    }

    async fn filter(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let (query, params) = filter_query(filter);
        let params: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| &**p as &(dyn ToSql + Sync))
            .collect();
        let client = self.pool.get().await?;
        let rows = client.query(query.as_str(), &params).await?;
        rows.iter().map(order_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_code_is_invalid_data() {
        assert_eq!(status_from_code(2).unwrap(), OrderStatus::InProgress);
        assert!(matches!(status_from_code(9), Err(RepositoryError::InvalidData(_))));
    }

    #[test]
    fn test_empty_filter_selects_everything() {
        let (query, params) = filter_query(&OrderFilter::default());
        assert!(!query.contains("WHERE"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_query_is_parameterised() {
        let worker = Uuid::new_v4();
        let filter = OrderFilter::default()
            .with_statuses([OrderStatus::New, OrderStatus::InProgress])
            .with_worker(RefFilter::AnyOf { ids: vec![worker], or_null: true })
            .with_user(RefFilter::NotNull);
        let (query, params) = filter_query(&filter);

        assert_eq!(params.len(), 2);
        assert!(query.contains("status = ANY($1)"));
        assert!(query.contains("(worker_id = ANY($2) OR worker_id IS NULL)"));
        assert!(query.contains("user_id IS NOT NULL"));
        assert!(!query.contains(&worker.to_string()));
    }

    #[test]
    fn test_null_worker_filter() {
        let filter = OrderFilter::default().with_worker(RefFilter::Null);
        let (query, params) = filter_query(&filter);
        assert!(query.ends_with("WHERE worker_id IS NULL ORDER BY creation_date"));
        assert!(params.is_empty());
    }
}
