//! # Customer Repository
//!
//! Users and their delivery addresses. Checkout only reads these; the
//! insert methods exist for seeding and tests.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use platter_core::{Address, User};

/// Repository for users and addresses.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn find_user(&self, id: &str) -> DbResult<Option<User>> {
        Self::fetch_user(&self.pool, id).await
    }

    pub async fn find_address(&self, id: &str) -> DbResult<Option<Address>> {
        Self::fetch_address(&self.pool, id).await
    }

    /// Looks up a user on any executor (pool or open transaction).
    pub async fn fetch_user<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, full_name FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn fetch_address<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, user_id, recipient_name, street, phone
            FROM addresses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(address)
    }

    pub async fn insert_user(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, email = %user.email, "Inserting user");

        sqlx::query("INSERT INTO users (id, email, full_name) VALUES (?1, ?2, ?3)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.full_name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn insert_address(&self, address: &Address) -> DbResult<()> {
        debug!(id = %address.id, user_id = %address.user_id, "Inserting address");

        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, recipient_name, street, phone)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&address.id)
        .bind(&address.user_id)
        .bind(&address.recipient_name)
        .bind(&address.street)
        .bind(&address.phone)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
