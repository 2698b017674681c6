//! Role and role-claim repository

use crate::db::DynDatabasePool;
use crate::models::{Role, RoleClaim};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Role>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Role>>;

    /// Case-insensitive name lookup
    async fn get_by_name(&self, name: &str) -> Result<Option<Role>>;

    async fn create(&self, role: &Role) -> Result<Role>;

    async fn update(&self, role: &Role) -> Result<bool>;

    /// Physical delete; memberships and claims cascade
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Number of live users holding the role
    async fn user_count(&self, role_id: &str) -> Result<i64>;

    async fn claims(&self, role_id: &str) -> Result<Vec<RoleClaim>>;

    /// Replace every claim of the role in one transaction
    async fn replace_claims(&self, role_id: &str, claims: &[RoleClaim]) -> Result<()>;
}

pub struct SqlxRoleRepository {
    pool: DynDatabasePool,
}

impl SqlxRoleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RoleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn list(&self) -> Result<Vec<Role>> {
        let roles = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Role>("SELECT id, name, description, created_on FROM roles ORDER BY name")
                .fetch_all(p)
                .await
                .context("Failed to list roles")?
        });
        Ok(roles)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Role>> {
        let role = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Role>("SELECT id, name, description, created_on FROM roles WHERE id = ?")
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get role")?
        });
        Ok(role)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Role>(
                "SELECT id, name, description, created_on FROM roles WHERE LOWER(name) = LOWER(?)",
            )
            .bind(name.trim())
            .fetch_optional(p)
            .await
            .context("Failed to get role by name")?
        });
        Ok(role)
    }

    async fn create(&self, role: &Role) -> Result<Role> {
        with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO roles (id, name, description, created_on) VALUES (?, ?, ?, ?)")
                .bind(&role.id)
                .bind(&role.name)
                .bind(&role.description)
                .bind(role.created_on)
                .execute(p)
                .await
                .context("Failed to create role")?;
        });
        Ok(role.clone())
    }

    async fn update(&self, role: &Role) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE roles SET name = ?, description = ? WHERE id = ?")
                .bind(&role.name)
                .bind(&role.description)
                .bind(&role.id)
                .execute(p)
                .await
                .context("Failed to update role")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM roles WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete role")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn user_count(&self, role_id: &str) -> Result<i64> {
        let sql = "SELECT COUNT(*) FROM user_roles ur JOIN users u ON u.id = ur.user_id \
                   WHERE ur.role_id = ? AND u.is_deleted = 0";
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(role_id)
                .fetch_one(p)
                .await
                .context("Failed to count role members")?
        });
        Ok(count)
    }

    async fn claims(&self, role_id: &str) -> Result<Vec<RoleClaim>> {
        let sql = "SELECT id, role_id, claim_type, claim_value, description, claim_group \
                   FROM role_claims WHERE role_id = ? ORDER BY id";
        let claims = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, RoleClaim>(sql)
                .bind(role_id)
                .fetch_all(p)
                .await
                .context("Failed to load role claims")?
        });
        Ok(claims)
    }

    async fn replace_claims(&self, role_id: &str, claims: &[RoleClaim]) -> Result<()> {
        let insert = "INSERT INTO role_claims (role_id, claim_type, claim_value, description, claim_group) \
                      VALUES (?, ?, ?, ?, ?)";
        with_pool!(self.pool, |p| {
            let mut tx = p.begin().await.context("Failed to begin transaction")?;
            sqlx::query("DELETE FROM role_claims WHERE role_id = ?")
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear role claims")?;
            for claim in claims {
                sqlx::query(insert)
                    .bind(role_id)
                    .bind(&claim.claim_type)
                    .bind(&claim.claim_value)
                    .bind(&claim.description)
                    .bind(&claim.claim_group)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to insert role claim")?;
            }
            tx.commit().await.context("Failed to commit role claims")?;
        });
        Ok(())
    }
}
