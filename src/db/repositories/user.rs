//! User repository
//!
//! Users, their role memberships, and the permission claims those roles grant.

use crate::db::DynDatabasePool;
use crate::models::User;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, first_name, last_name, user_name, email, phone_number, \
     profile_picture_url, password_hash, email_confirmed, is_active, created_on";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Case-insensitive lookup among live users
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_by_user_name(&self, user_name: &str) -> Result<Option<User>>;

    /// Whether the email is held by any other row, deleted ones included
    async fn email_taken(&self, email: &str, except_id: Option<&str>) -> Result<bool>;

    async fn user_name_taken(&self, user_name: &str, except_id: Option<&str>) -> Result<bool>;

    async fn list(&self) -> Result<Vec<User>>;

    /// Update profile fields; the password goes through `update_credentials`
    async fn update(&self, user: &User) -> Result<bool>;

    async fn update_credentials(&self, id: &str, email: &str, password_hash: &str) -> Result<bool>;

    async fn set_active(&self, id: &str, active: bool) -> Result<bool>;

    async fn soft_delete(&self, id: &str) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn role_names(&self, user_id: &str) -> Result<Vec<String>>;

    /// Replace the user's memberships with `role_ids`
    async fn set_roles(&self, user_id: &str, role_ids: &[String]) -> Result<()>;

    async fn add_role(&self, user_id: &str, role_id: &str) -> Result<()>;

    /// Distinct permission claim values granted through the user's roles
    async fn permissions(&self, user_id: &str) -> Result<Vec<String>>;
}

pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let sql = "INSERT INTO users (id, first_name, last_name, user_name, email, phone_number, \
                   profile_picture_url, password_hash, email_confirmed, is_active, created_on) \
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
        with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&user.id)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.user_name)
                .bind(&user.email)
                .bind(&user.phone_number)
                .bind(&user.profile_picture_url)
                .bind(&user.password_hash)
                .bind(user.email_confirmed)
                .bind(user.is_active)
                .bind(user.created_on)
                .execute(p)
                .await
                .context("Failed to create user")?;
        });
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ? AND is_deleted = 0", USER_COLUMNS);
        let user = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
                .context("Failed to get user by ID")?
        });
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER(?) AND is_deleted = 0",
            USER_COLUMNS
        );
        let user = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, User>(&sql)
                .bind(email.trim())
                .fetch_optional(p)
                .await
                .context("Failed to get user by email")?
        });
        Ok(user)
    }

    async fn get_by_user_name(&self, user_name: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(user_name) = LOWER(?) AND is_deleted = 0",
            USER_COLUMNS
        );
        let user = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, User>(&sql)
                .bind(user_name.trim())
                .fetch_optional(p)
                .await
                .context("Failed to get user by user name")?
        });
        Ok(user)
    }

    async fn email_taken(&self, email: &str, except_id: Option<&str>) -> Result<bool> {
        let sql = "SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER(?) AND id <> ?";
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(email.trim())
                .bind(except_id.unwrap_or(""))
                .fetch_one(p)
                .await
                .context("Failed to check email")?
        });
        Ok(count > 0)
    }

    async fn user_name_taken(&self, user_name: &str, except_id: Option<&str>) -> Result<bool> {
        let sql = "SELECT COUNT(*) FROM users WHERE LOWER(user_name) = LOWER(?) AND id <> ?";
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(user_name.trim())
                .bind(except_id.unwrap_or(""))
                .fetch_one(p)
                .await
                .context("Failed to check user name")?
        });
        Ok(count > 0)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE is_deleted = 0 ORDER BY first_name, last_name, user_name",
            USER_COLUMNS
        );
        let users = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, User>(&sql)
                .fetch_all(p)
                .await
                .context("Failed to list users")?
        });
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<bool> {
        let sql = "UPDATE users SET first_name = ?, last_name = ?, user_name = ?, email = ?, \
                   phone_number = ?, profile_picture_url = ?, is_active = ? \
                   WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.user_name)
                .bind(&user.email)
                .bind(&user.phone_number)
                .bind(&user.profile_picture_url)
                .bind(user.is_active)
                .bind(&user.id)
                .execute(p)
                .await
                .context("Failed to update user")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn update_credentials(&self, id: &str, email: &str, password_hash: &str) -> Result<bool> {
        let sql = "UPDATE users SET email = ?, password_hash = ? WHERE id = ? AND is_deleted = 0";
        let affected = with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(email)
                .bind(password_hash)
                .bind(id)
                .execute(p)
                .await
                .context("Failed to update user credentials")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE users SET is_active = ? WHERE id = ? AND is_deleted = 0")
                .bind(active)
                .bind(id)
                .execute(p)
                .await
                .context("Failed to change user status")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn soft_delete(&self, id: &str) -> Result<bool> {
        let affected = with_pool!(self.pool, |p| {
            sqlx::query("UPDATE users SET is_deleted = 1, is_active = 0 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(p)
                .await
                .context("Failed to delete user")?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = 0")
                .fetch_one(p)
                .await
                .context("Failed to count users")?
        });
        Ok(count)
    }

    async fn role_names(&self, user_id: &str) -> Result<Vec<String>> {
        let sql = "SELECT r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.id \
                   WHERE ur.user_id = ? ORDER BY r.name";
        let names: Vec<String> = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(user_id)
                .fetch_all(p)
                .await
                .context("Failed to load user roles")?
        });
        Ok(names)
    }

    async fn set_roles(&self, user_id: &str, role_ids: &[String]) -> Result<()> {
        with_pool!(self.pool, |p| {
            let mut tx = p.begin().await.context("Failed to begin transaction")?;
            sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear user roles")?;
            for role_id in role_ids {
                sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
                    .bind(user_id)
                    .bind(role_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to assign role")?;
            }
            tx.commit().await.context("Failed to commit user roles")?;
        });
        Ok(())
    }

    async fn add_role(&self, user_id: &str, role_id: &str) -> Result<()> {
        let assigned: i64 = with_pool!(self.pool, |p| {
            sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE user_id = ? AND role_id = ?")
                .bind(user_id)
                .bind(role_id)
                .fetch_one(p)
                .await
                .context("Failed to check role membership")?
        });
        if assigned > 0 {
            return Ok(());
        }
        with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(role_id)
                .execute(p)
                .await
                .context("Failed to assign role")?;
        });
        Ok(())
    }

    async fn permissions(&self, user_id: &str) -> Result<Vec<String>> {
        let sql = "SELECT DISTINCT rc.claim_value FROM role_claims rc \
                   JOIN user_roles ur ON ur.role_id = rc.role_id \
                   WHERE ur.user_id = ? AND rc.claim_type = 'Permission' \
                   ORDER BY rc.claim_value";
        let values: Vec<String> = with_pool!(self.pool, |p| {
            sqlx::query_scalar(sql)
                .bind(user_id)
                .fetch_all(p)
                .await
                .context("Failed to load user permissions")?
        });
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn sample_user(user_name: &str, email: &str) -> User {
        User::new("Sam".into(), "Doe".into(), user_name.into(), email.into(), "hash".into())
    }

    async fn insert_role(pool: &DynDatabasePool, id: &str, name: &str) {
        sqlx::query("INSERT INTO roles (id, name, description) VALUES (?, ?, '')")
            .bind(id)
            .bind(name)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let user = sample_user("sam", "sam@example.com");
        repo.create(&user).await.unwrap();

        let found = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found.user_name, "sam");
        assert_eq!(found.password_hash, "hash");
        assert!(found.is_active);
    }

    #[tokio::test]
    async fn test_lookups_ignore_case() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let user = sample_user("Sam", "Sam@Example.com");
        repo.create(&user).await.unwrap();

        assert!(repo.get_by_email("sam@example.com").await.unwrap().is_some());
        assert!(repo.get_by_user_name("SAM").await.unwrap().is_some());
        assert!(repo.email_taken("SAM@example.com", None).await.unwrap());
        assert!(!repo.email_taken("sam@example.com", Some(&user.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_email_reserved() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let user = sample_user("gone", "gone@example.com");
        repo.create(&user).await.unwrap();

        assert!(repo.soft_delete(&user.id).await.unwrap());
        assert!(repo.get_by_id(&user.id).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.email_taken("gone@example.com", None).await.unwrap());
        assert!(!repo.soft_delete(&user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_status() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let mut user = sample_user("u", "u@example.com");
        repo.create(&user).await.unwrap();

        user.first_name = "Changed".into();
        user.phone_number = Some("123".into());
        assert!(repo.update(&user).await.unwrap());
        assert!(repo.set_active(&user.id, false).await.unwrap());

        let found = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found.first_name, "Changed");
        assert_eq!(found.phone_number.as_deref(), Some("123"));
        assert!(!found.is_active);
    }

    #[tokio::test]
    async fn test_roles_and_permissions() {
        let pool = migrated_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        let user = sample_user("r", "r@example.com");
        repo.create(&user).await.unwrap();
        insert_role(&pool, "role-a", "Editors").await;
        insert_role(&pool, "role-b", "Viewers").await;
        sqlx::query("INSERT INTO role_claims (role_id, claim_type, claim_value) VALUES ('role-a', 'Permission', 'Permissions.Blocks.Edit'), ('role-b', 'Permission', 'Permissions.Blocks.View'), ('role-b', 'Permission', 'Permissions.Blocks.Edit')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        repo.set_roles(&user.id, &["role-a".to_string(), "role-b".to_string()]).await.unwrap();
        assert_eq!(repo.role_names(&user.id).await.unwrap(), vec!["Editors", "Viewers"]);
        assert_eq!(
            repo.permissions(&user.id).await.unwrap(),
            vec!["Permissions.Blocks.Edit", "Permissions.Blocks.View"]
        );

        repo.set_roles(&user.id, &["role-b".to_string()]).await.unwrap();
        repo.add_role(&user.id, "role-b").await.unwrap();
        assert_eq!(repo.role_names(&user.id).await.unwrap(), vec!["Viewers"]);
    }
}
