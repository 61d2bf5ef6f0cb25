use async_trait::async_trait;
use model::User;
use tokio_postgres::Row;
use uuid::Uuid;

use super::{expect_affected, map_write_error};
use crate::{RepositoryError, UserRepository};

pg_repository!(PgUserRepository, "PostgreSQL implementation of [`UserRepository`].");

const USER_COLUMNS: &str = "id, name, surname, address, phone_number, email, password";

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        surname: row.get("surname"),
        address: row.get("address"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
        password: row.get("password"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let query = r#"
            INSERT INTO users (id, name, surname, address, phone_number, email, password)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;
        let client = self.pool.get().await?;
        client.execute(query, &[
            &user.id,
            &user.name,
            &user.surname,
            &user.address,
            &user.phone_number,
            &user.email,
            &user.password,
        ]).await.map_err(map_write_error)?;
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = $1, surname = $2, address = $3, phone_number = $4, email = $5, password = $6
            WHERE id = $7
            RETURNING {USER_COLUMNS}
            "#
        );
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[
            &user.name,
            &user.surname,
            &user.address,
            &user.phone_number,
            &user.email,
            &user.password,
            &user.id,
        ]).await.map_err(map_write_error)?;
        row.as_ref().map(user_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM users WHERE id = $1", &[&id]).await?;
        expect_affected(deleted)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[&id]).await?;
        row.as_ref().map(user_from_row).ok_or(RepositoryError::NotFound)
    }

    async fn get_all_users(&self) -> Result<Vec<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY surname, name");
        let client = self.pool.get().await?;
        let rows = client.query(query.as_str(), &[]).await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let client = self.pool.get().await?;
        let row = client.query_opt(query.as_str(), &[&email]).await?;
        row.as_ref().map(user_from_row).ok_or(RepositoryError::NotFound)
    }
}
