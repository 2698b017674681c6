//! Role and permission service
//!
//! Roles are editable except for the two built-in ones. Permissions are
//! stored as role claims of type `Permission`, chosen from the static
//! catalogue in `models::permission`.

use crate::db::repositories::RoleRepository;
use crate::models::permission::{all_permissions, find_permission, permission_name};
use crate::models::{
    is_protected_role, Action, PermissionGroup, Role, RoleClaim, RoleClaimEntry, RoleInput,
    RolePermissions, UpdatePermissionsInput, ADMINISTRATOR_ROLE, BASIC_ROLE, PERMISSION_CLAIM_TYPE,
};
use crate::services::user::IdentityError;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RoleService {
    role_repo: Arc<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(role_repo: Arc<dyn RoleRepository>) -> Self {
        Self { role_repo }
    }

    pub async fn list(&self) -> Result<Vec<Role>, IdentityError> {
        Ok(self.role_repo.list().await?)
    }

    async fn get(&self, id: &str) -> Result<Role, IdentityError> {
        self.role_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::NotFound("Role Not Found.".to_string()))
    }

    /// Create (blank id) or update a role
    pub async fn upsert(&self, input: RoleInput) -> Result<Role, IdentityError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(IdentityError::Validation("Role name is required.".to_string()));
        }
        let description = input.description.trim().to_string();
        let existing = self.role_repo.get_by_name(&name).await?;

        match input.id {
            None => {
                if existing.is_some() {
                    return Err(IdentityError::Conflict(format!("Role {} already exists.", name)));
                }
                let role = self.role_repo.create(&Role::new(name, description)).await?;
                tracing::info!(role_id = %role.id, role = %role.name, "Role created");
                Ok(role)
            }
            Some(id) => {
                let mut role = self.get(&id).await?;
                if is_protected_role(&role.name) && !role.name.eq_ignore_ascii_case(&name) {
                    return Err(IdentityError::Validation(format!(
                        "Not allowed to modify {} Role.",
                        role.name
                    )));
                }
                if existing.is_some_and(|other| other.id != role.id) {
                    return Err(IdentityError::Conflict(format!("Role {} already exists.", name)));
                }
                role.name = name;
                role.description = description;
                self.role_repo.update(&role).await?;
                Ok(role)
            }
        }
    }

    /// Delete a role that is neither built in nor assigned
    pub async fn delete(&self, id: &str) -> Result<(), IdentityError> {
        let role = self.get(id).await?;
        if is_protected_role(&role.name) {
            return Err(IdentityError::Validation(format!(
                "Not allowed to delete {} Role.",
                role.name
            )));
        }
        if self.role_repo.user_count(id).await? > 0 {
            return Err(IdentityError::Validation(format!(
                "Not allowed to delete {} Role as it is being used.",
                role.name
            )));
        }
        self.role_repo.delete(id).await?;
        tracing::info!(role_id = %id, role = %role.name, "Role deleted");
        Ok(())
    }

    /// The whole catalogue, `selected` where the role holds the claim
    pub async fn permissions(&self, role_id: &str) -> Result<RolePermissions, IdentityError> {
        let role = self.get(role_id).await?;
        let is_admin = role.name.eq_ignore_ascii_case(ADMINISTRATOR_ROLE);
        let held: HashMap<String, i64> = self
            .role_repo
            .claims(role_id)
            .await?
            .into_iter()
            .filter(|c| c.claim_type == PERMISSION_CLAIM_TYPE)
            .map(|c| (c.claim_value, c.id))
            .collect();

        let role_claims = all_permissions()
            .iter()
            .map(|perm| {
                let held_id = held.get(&perm.value).copied();
                RoleClaimEntry {
                    id: held_id.unwrap_or(0),
                    role_id: role.id.clone(),
                    claim_type: PERMISSION_CLAIM_TYPE.to_string(),
                    value: perm.value.clone(),
                    description: perm.description.clone(),
                    group: perm.group.to_string(),
                    selected: is_admin || held_id.is_some(),
                }
            })
            .collect();

        Ok(RolePermissions {
            role_id: role.id,
            role_name: role.name,
            role_claims,
        })
    }

    /// Replace the role's permission claims with the selected entries
    pub async fn update_permissions(&self, input: UpdatePermissionsInput) -> Result<(), IdentityError> {
        let role = self.get(&input.role_id).await?;
        if role.name.eq_ignore_ascii_case(ADMINISTRATOR_ROLE) {
            return Err(IdentityError::Validation(
                "Not allowed to modify Permissions for this Role.".to_string(),
            ));
        }

        let mut claims: Vec<RoleClaim> = Vec::new();
        for entry in input.role_claims.iter().filter(|e| e.selected) {
            let perm = find_permission(&entry.value)
                .ok_or_else(|| IdentityError::Validation(format!("Unknown permission: {}", entry.value)))?;
            if claims.iter().any(|c| c.claim_value == perm.value) {
                continue;
            }
            claims.push(claim_for(&role.id, &perm.value, &perm.description, perm.group));
        }

        self.role_repo.replace_claims(&role.id, &claims).await?;
        tracing::info!(role_id = %role.id, claims = claims.len(), "Role permissions updated");
        Ok(())
    }

    /// Create the built-in roles when missing, returning Administrator.
    ///
    /// A freshly created Basic role may use chat and nothing else.
    pub async fn ensure_default_roles(&self) -> Result<Role, IdentityError> {
        let admin = match self.role_repo.get_by_name(ADMINISTRATOR_ROLE).await? {
            Some(role) => role,
            None => {
                let role = Role::new(
                    ADMINISTRATOR_ROLE.to_string(),
                    "Administrator role with all permissions".to_string(),
                );
                tracing::info!("Seeding Administrator role");
                self.role_repo.create(&role).await?
            }
        };

        if self.role_repo.get_by_name(BASIC_ROLE).await?.is_none() {
            let role = self
                .role_repo
                .create(&Role::new(
                    BASIC_ROLE.to_string(),
                    "Basic role given to new users".to_string(),
                ))
                .await?;
            let claims: Vec<RoleClaim> = PermissionGroup::Chat
                .actions()
                .iter()
                .filter_map(|action| find_permission(&permission_name(PermissionGroup::Chat, *action)))
                .map(|perm| claim_for(&role.id, &perm.value, &perm.description, perm.group))
                .collect();
            self.role_repo.replace_claims(&role.id, &claims).await?;
            tracing::info!("Seeding Basic role");
        }

        Ok(admin)
    }
}

fn claim_for(role_id: &str, value: &str, description: &str, group: &str) -> RoleClaim {
    RoleClaim {
        id: 0,
        role_id: role_id.to_string(),
        claim_type: PERMISSION_CLAIM_TYPE.to_string(),
        claim_value: value.to_string(),
        description: description.to_string(),
        claim_group: group.to_string(),
    }
}

/// Whether the access granted by `permissions` covers `group`/`action`
pub fn grants(permissions: &[String], group: PermissionGroup, action: Action) -> bool {
    let wanted = permission_name(group, action);
    permissions.iter().any(|p| *p == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, migrated_pool};
    use crate::db::repositories::{SqlxRoleRepository, SqlxUserRepository, UserRepository};

    async fn setup() -> (RoleService, Arc<dyn UserRepository>, Role) {
        let pool = migrated_pool().await;
        let service = RoleService::new(SqlxRoleRepository::boxed(pool.clone()));
        let admin = service.ensure_default_roles().await.unwrap();
        insert_user(&pool, "u1").await;
        (service, SqlxUserRepository::boxed(pool), admin)
    }

    fn input(id: Option<&str>, name: &str) -> RoleInput {
        RoleInput {
            id: id.map(str::to_string),
            name: name.to_string(),
            description: format!("{} role", name),
        }
    }

    #[tokio::test]
    async fn test_default_roles_are_idempotent() {
        let (service, _, admin) = setup().await;
        let again = service.ensure_default_roles().await.unwrap();
        assert_eq!(admin.id, again.id);

        let names: Vec<String> = service.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec![ADMINISTRATOR_ROLE.to_string(), BASIC_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_create_update_conflict() {
        let (service, _, _) = setup().await;

        let editor = service.upsert(input(None, "Editor")).await.unwrap();
        assert!(matches!(
            service.upsert(input(None, "editor")).await,
            Err(IdentityError::Conflict(_))
        ));

        let renamed = service.upsert(input(Some(&editor.id), "Writer")).await.unwrap();
        assert_eq!(renamed.id, editor.id);
        assert_eq!(renamed.name, "Writer");

        assert!(matches!(
            service.upsert(input(Some(&editor.id), BASIC_ROLE)).await,
            Err(IdentityError::Conflict(_))
        ));
        assert!(matches!(
            service.upsert(input(Some("missing"), "X")).await,
            Err(IdentityError::NotFound(_))
        ));
        assert!(matches!(
            service.upsert(input(None, "  ")).await,
            Err(IdentityError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_protected_roles() {
        let (service, _, admin) = setup().await;

        assert!(matches!(
            service.upsert(input(Some(&admin.id), "Root")).await,
            Err(IdentityError::Validation(_))
        ));
        // description edits are fine
        service.upsert(input(Some(&admin.id), ADMINISTRATOR_ROLE)).await.unwrap();

        assert!(matches!(service.delete(&admin.id).await, Err(IdentityError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_refused_while_assigned() {
        let (service, users, _) = setup().await;
        let editor = service.upsert(input(None, "Editor")).await.unwrap();
        users.add_role("u1", &editor.id).await.unwrap();

        assert!(matches!(service.delete(&editor.id).await, Err(IdentityError::Validation(_))));

        users.set_roles("u1", &[]).await.unwrap();
        service.delete(&editor.id).await.unwrap();
        assert!(matches!(service.delete(&editor.id).await, Err(IdentityError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_permissions_catalogue_and_update() {
        let (service, users, admin) = setup().await;
        let editor = service.upsert(input(None, "Editor")).await.unwrap();

        let mut perms = service.permissions(&editor.id).await.unwrap();
        assert_eq!(perms.role_claims.len(), all_permissions().len());
        assert!(perms.role_claims.iter().all(|c| !c.selected));

        for claim in perms.role_claims.iter_mut() {
            claim.selected = claim.group == "Blocks";
        }
        service
            .update_permissions(UpdatePermissionsInput {
                role_id: editor.id.clone(),
                role_claims: perms.role_claims,
            })
            .await
            .unwrap();

        let selected: Vec<String> = service
            .permissions(&editor.id)
            .await
            .unwrap()
            .role_claims
            .into_iter()
            .filter(|c| c.selected)
            .map(|c| c.value)
            .collect();
        assert_eq!(selected.len(), 4);

        users.add_role("u1", &editor.id).await.unwrap();
        let granted = users.permissions("u1").await.unwrap();
        assert!(grants(&granted, PermissionGroup::Blocks, Action::Edit));
        assert!(!grants(&granted, PermissionGroup::Menus, Action::View));

        // administrator shows everything selected and cannot be edited
        let admin_perms = service.permissions(&admin.id).await.unwrap();
        assert!(admin_perms.role_claims.iter().all(|c| c.selected));
        assert!(matches!(
            service
                .update_permissions(UpdatePermissionsInput {
                    role_id: admin.id.clone(),
                    role_claims: vec![],
                })
                .await,
            Err(IdentityError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_permission_rejected() {
        let (service, _, _) = setup().await;
        let editor = service.upsert(input(None, "Editor")).await.unwrap();
        let bogus = RoleClaimEntry {
            id: 0,
            role_id: editor.id.clone(),
            claim_type: PERMISSION_CLAIM_TYPE.to_string(),
            value: "Permissions.Everything.Ever".to_string(),
            description: String::new(),
            group: String::new(),
            selected: true,
        };
        assert!(matches!(
            service
                .update_permissions(UpdatePermissionsInput {
                    role_id: editor.id,
                    role_claims: vec![bogus],
                })
                .await,
            Err(IdentityError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_basic_role_can_chat() {
        let (service, _, _) = setup().await;
        let basic = service.list().await.unwrap().into_iter().find(|r| r.name == BASIC_ROLE).unwrap();
        let selected: Vec<String> = service
            .permissions(&basic.id)
            .await
            .unwrap()
            .role_claims
            .into_iter()
            .filter(|c| c.selected)
            .map(|c| c.value)
            .collect();
        assert_eq!(selected, vec!["Permissions.Chat.View".to_string(), "Permissions.Chat.Send".to_string()]);
    }
}
