use crate::credential::CredentialHasher;
use crate::entity::{EntityKind, Permission, Role, User};
use crate::error::{Error, Result};
use crate::status::Status;
use crate::store::{DirectoryStore, SwapOutcome, Updated};
use crate::types::{EmailAddress, PermissionId, PermissionName, RoleId, RoleName, UserId};
use std::fmt;
use std::sync::Arc;

/// Directory service: entity lifecycle management plus the assignment
/// engine over the two association relations.
///
/// Every operation either fully succeeds or fails with exactly one error
/// kind; partial mutation is never observable. Existence and duplicate
/// checks are evaluated against committed state, and the compound writes
/// commit through the store's atomic primitives.
pub struct Directory<S> {
    store: S,
    hasher: Arc<dyn CredentialHasher>,
}

fn updated_or<T>(outcome: Updated<T>, kind: EntityKind, id: &impl fmt::Display) -> Result<T> {
    match outcome {
        Updated::Applied(value) => Ok(value),
        Updated::Missing => Err(Error::not_found(kind, id)),
        Updated::Rejected(error) => Err(error),
    }
}

impl<S> Directory<S>
where
    S: DirectoryStore,
{
    /// Creates a directory over a store and a credential collaborator.
    pub fn new(store: S, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Registers a new user in `PENDING` status.
    ///
    /// The password is hashed through the credential collaborator; the
    /// directory persists only the opaque result. Fails `AlreadyExists`
    /// when the email is taken.
    pub async fn create_user(
        &self,
        full_name: &str,
        email: EmailAddress,
        password: &str,
    ) -> Result<User> {
        if self
            .store
            .user_email_exists(email.as_str())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::already_exists(EntityKind::User, &email));
        }

        let credential_hash = self.hasher.hash(password).map_err(Error::Credential)?;
        let user = User::new(full_name, email, credential_hash)?;

        // The store re-checks email uniqueness atomically with the insert.
        if !self
            .store
            .insert_user(user.clone())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::already_exists(EntityKind::User, user.email()));
        }
        tracing::debug!(user = %user.id(), "user created");
        Ok(user)
    }

    /// Looks up a user by public identifier.
    pub async fn find_user(&self, id: &UserId) -> Result<User> {
        self.store
            .find_user(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::User, id))
    }

    /// Looks up a user by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<User> {
        self.store
            .find_user_by_email(email)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::User, email))
    }

    /// Replaces a user's full name and re-stamps last-modified.
    pub async fn update_user_full_name(&self, id: &UserId, full_name: &str) -> Result<User> {
        let outcome = self
            .store
            .update_user(id, &|user: &mut User| user.update_full_name(full_name))
            .await
            .map_err(Error::from)?;
        updated_or(outcome, EntityKind::User, id)
    }

    /// Re-hashes and replaces a user's credential.
    pub async fn change_user_password(&self, id: &UserId, new_password: &str) -> Result<User> {
        let credential_hash = self.hasher.hash(new_password).map_err(Error::Credential)?;
        let outcome = self
            .store
            .update_user(id, &|user: &mut User| {
                user.change_credential_hash(credential_hash.clone())
            })
            .await
            .map_err(Error::from)?;
        updated_or(outcome, EntityKind::User, id)
    }

    /// Moves a user through the lifecycle machine.
    pub async fn change_user_status(&self, id: &UserId, target: Status) -> Result<User> {
        let outcome = self
            .store
            .update_user(id, &|user: &mut User| user.change_status(target))
            .await
            .map_err(Error::from)?;
        let user = updated_or(outcome, EntityKind::User, id)?;
        tracing::debug!(user = %id, status = %user.status(), "user status changed");
        Ok(user)
    }

    /// Creates a new role in `PENDING` status; fails `AlreadyExists` on a
    /// name collision.
    pub async fn create_role(&self, name: RoleName, description: &str) -> Result<Role> {
        if self
            .store
            .role_name_exists(name.as_str())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::already_exists(EntityKind::Role, &name));
        }

        let role = Role::new(name, description)?;
        // The store re-checks name uniqueness atomically with the insert.
        if !self
            .store
            .insert_role(role.clone())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::already_exists(EntityKind::Role, role.name()));
        }
        tracing::debug!(role = %role.id(), name = %role.name(), "role created");
        Ok(role)
    }

    /// Looks up a role by public identifier.
    pub async fn find_role(&self, id: &RoleId) -> Result<Role> {
        self.store
            .find_role(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::Role, id))
    }

    /// Looks up a role by unique name.
    pub async fn find_role_by_name(&self, name: &str) -> Result<Role> {
        self.store
            .find_role_by_name(name)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::Role, name))
    }

    /// Replaces a role's description and re-stamps last-modified.
    pub async fn update_role_description(&self, id: &RoleId, description: &str) -> Result<Role> {
        let outcome = self
            .store
            .update_role(id, &|role: &mut Role| role.update_description(description))
            .await
            .map_err(Error::from)?;
        updated_or(outcome, EntityKind::Role, id)
    }

    /// Moves a role through the lifecycle machine.
    pub async fn change_role_status(&self, id: &RoleId, target: Status) -> Result<Role> {
        let outcome = self
            .store
            .update_role(id, &|role: &mut Role| role.change_status(target))
            .await
            .map_err(Error::from)?;
        let role = updated_or(outcome, EntityKind::Role, id)?;
        tracing::debug!(role = %id, status = %role.status(), "role status changed");
        Ok(role)
    }

    /// Creates a new permission in `PENDING` status; fails `AlreadyExists`
    /// on a name collision.
    pub async fn create_permission(
        &self,
        name: PermissionName,
        description: &str,
    ) -> Result<Permission> {
        if self
            .store
            .permission_name_exists(name.as_str())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::already_exists(EntityKind::Permission, &name));
        }

        let permission = Permission::new(name, description)?;
        // The store re-checks name uniqueness atomically with the insert.
        if !self
            .store
            .insert_permission(permission.clone())
            .await
            .map_err(Error::from)?
        {
            return Err(Error::already_exists(
                EntityKind::Permission,
                permission.name(),
            ));
        }
        tracing::debug!(
            permission = %permission.id(),
            name = %permission.name(),
            "permission created"
        );
        Ok(permission)
    }

    /// Looks up a permission by public identifier.
    pub async fn find_permission(&self, id: &PermissionId) -> Result<Permission> {
        self.store
            .find_permission(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::Permission, id))
    }

    /// Looks up a permission by unique name.
    pub async fn find_permission_by_name(&self, name: &str) -> Result<Permission> {
        self.store
            .find_permission_by_name(name)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::Permission, name))
    }

    /// Replaces a permission's description and re-stamps last-modified.
    pub async fn update_permission_description(
        &self,
        id: &PermissionId,
        description: &str,
    ) -> Result<Permission> {
        let outcome = self
            .store
            .update_permission(id, &|permission: &mut Permission| {
                permission.update_description(description)
            })
            .await
            .map_err(Error::from)?;
        updated_or(outcome, EntityKind::Permission, id)
    }

    /// Moves a permission through the lifecycle machine.
    pub async fn change_permission_status(
        &self,
        id: &PermissionId,
        target: Status,
    ) -> Result<Permission> {
        let outcome = self
            .store
            .update_permission(id, &|permission: &mut Permission| {
                permission.change_status(target)
            })
            .await
            .map_err(Error::from)?;
        let permission = updated_or(outcome, EntityKind::Permission, id)?;
        tracing::debug!(
            permission = %id,
            status = %permission.status(),
            "permission status changed"
        );
        Ok(permission)
    }

    /// Grants a role to a user.
    ///
    /// Both entities must exist; status is not consulted here, gating
    /// happens at resolution time. A second identical call fails
    /// `AlreadyAssigned` rather than silently succeeding, so callers can
    /// detect duplicate requests.
    pub async fn assign_role_to_user(&self, user: &UserId, role: &RoleId) -> Result<()> {
        self.find_user(user).await?;
        self.find_role(role).await?;
        if self
            .store
            .user_role_exists(user, role)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::RoleAlreadyAssigned {
                user: user.clone(),
                role: role.clone(),
            });
        }

        // The store re-checks the pair atomically with the insert.
        if !self
            .store
            .insert_user_role(user, role)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::RoleAlreadyAssigned {
                user: user.clone(),
                role: role.clone(),
            });
        }
        tracing::debug!(user = %user, role = %role, "role assigned to user");
        Ok(())
    }

    /// Substitutes one held role for another as a single atomic step.
    ///
    /// Resolution concurrent with this operation never observes the user
    /// holding both roles or neither; the store's swap commits the delete
    /// and insert as one unit and re-validates both pair conditions.
    pub async fn replace_user_role(
        &self,
        user: &UserId,
        old_role: &RoleId,
        new_role: &RoleId,
    ) -> Result<()> {
        self.find_user(user).await?;
        if !self
            .store
            .user_role_exists(user, old_role)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::RoleAssignmentNotFound {
                user: user.clone(),
                role: old_role.clone(),
            });
        }
        self.find_role(new_role).await?;

        match self
            .store
            .swap_user_role(user, old_role, new_role)
            .await
            .map_err(Error::from)?
        {
            SwapOutcome::Swapped => {
                tracing::debug!(
                    user = %user,
                    old_role = %old_role,
                    new_role = %new_role,
                    "user role replaced"
                );
                Ok(())
            }
            SwapOutcome::OldAssignmentMissing => Err(Error::RoleAssignmentNotFound {
                user: user.clone(),
                role: old_role.clone(),
            }),
            SwapOutcome::NewAlreadyAssigned => Err(Error::RoleAlreadyAssigned {
                user: user.clone(),
                role: new_role.clone(),
            }),
        }
    }

    /// Revokes a held role; fails `AssignmentNotFound` when the pair does
    /// not exist.
    pub async fn revoke_user_role(&self, user: &UserId, role: &RoleId) -> Result<()> {
        if !self
            .store
            .remove_user_role(user, role)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::RoleAssignmentNotFound {
                user: user.clone(),
                role: role.clone(),
            });
        }
        tracing::debug!(user = %user, role = %role, "user role revoked");
        Ok(())
    }

    /// Grants a permission to a role; mirrors [`Self::assign_role_to_user`].
    pub async fn assign_permission_to_role(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> Result<()> {
        self.find_role(role).await?;
        self.find_permission(permission).await?;
        if self
            .store
            .role_permission_exists(role, permission)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::PermissionAlreadyAssigned {
                role: role.clone(),
                permission: permission.clone(),
            });
        }

        // The store re-checks the pair atomically with the insert.
        if !self
            .store
            .insert_role_permission(role, permission)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::PermissionAlreadyAssigned {
                role: role.clone(),
                permission: permission.clone(),
            });
        }
        tracing::debug!(role = %role, permission = %permission, "permission assigned to role");
        Ok(())
    }

    /// Revokes a granted permission; fails `AssignmentNotFound` when the
    /// pair does not exist.
    pub async fn revoke_permission_from_role(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> Result<()> {
        if !self
            .store
            .remove_role_permission(role, permission)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::PermissionAssignmentNotFound {
                role: role.clone(),
                permission: permission.clone(),
            });
        }
        tracing::debug!(role = %role, permission = %permission, "role permission revoked");
        Ok(())
    }

    /// Lists the roles a user currently holds, status included.
    pub async fn user_roles(&self, user: &UserId) -> Result<Vec<Role>> {
        self.find_user(user).await?;
        self.store.user_roles(user).await.map_err(Error::from)
    }

    /// Returns a role together with every permission it grants.
    ///
    /// This is the administrative view: no status filtering is applied.
    pub async fn role_with_permissions(&self, role: &RoleId) -> Result<(Role, Vec<Permission>)> {
        let record = self.find_role(role).await?;
        let permissions = self
            .store
            .role_permissions(role)
            .await
            .map_err(Error::from)?;
        Ok((record, permissions))
    }
}
