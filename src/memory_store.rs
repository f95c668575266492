use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::entity::{Permission, Role, User};
use crate::store::{
    ApplyFn, AssignmentStore, AuthorityGraph, AuthorityStore, PermissionStore, RoleGrant,
    RoleStore, SwapOutcome, Updated, UserStore,
};
use crate::types::{PermissionId, RoleId, UserId};

/// In-memory store implementation for tests and demos.
///
/// Entities and associations live in flat keyed collections with
/// unique-name indexes; relationships are resolved through lookups, never
/// back-pointers. A single lock guards the whole arena and is the store's
/// transaction boundary: every compound primitive runs under one guard, so
/// concurrent duplicate attempts serialize with exactly one winner, and
/// graph reads are snapshot-consistent.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    users_by_email: HashMap<String, UserId>,
    roles: HashMap<RoleId, Role>,
    roles_by_name: HashMap<String, RoleId>,
    permissions: HashMap<PermissionId, Permission>,
    permissions_by_name: HashMap<String, PermissionId>,
    user_roles: HashMap<UserId, HashSet<RoleId>>,
    role_permissions: HashMap<RoleId, HashSet<PermissionId>>,
}

impl Inner {
    fn graph_for(&self, user: &User) -> AuthorityGraph {
        let grants = self
            .user_roles
            .get(user.id())
            .into_iter()
            .flatten()
            .filter_map(|role_id| self.roles.get(role_id))
            .map(|role| RoleGrant {
                role: role.clone(),
                permissions: self
                    .role_permissions
                    .get(role.id())
                    .into_iter()
                    .flatten()
                    .filter_map(|permission_id| self.permissions.get(permission_id))
                    .cloned()
                    .collect(),
            })
            .collect();
        AuthorityGraph {
            user: user.clone(),
            grants,
        }
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user record and cascades its role assignments in one unit.
    pub fn remove_user(&self, id: &UserId) -> bool {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(user) = guard.users.remove(id) else {
            return false;
        };
        guard.users_by_email.remove(user.email().as_str());
        guard.user_roles.remove(id);
        true
    }

    /// Removes a role record and cascades both its permission assignments
    /// and every user's assignment of it, in one unit.
    pub fn remove_role(&self, id: &RoleId) -> bool {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(role) = guard.roles.remove(id) else {
            return false;
        };
        guard.roles_by_name.remove(role.name().as_str());
        guard.role_permissions.remove(id);
        for assigned in guard.user_roles.values_mut() {
            assigned.remove(id);
        }
        guard.user_roles.retain(|_, assigned| !assigned.is_empty());
        true
    }

    /// Removes a permission record and cascades every role's assignment of
    /// it, in one unit.
    pub fn remove_permission(&self, id: &PermissionId) -> bool {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(permission) = guard.permissions.remove(id) else {
            return false;
        };
        guard
            .permissions_by_name
            .remove(permission.name().as_str());
        for granted in guard.role_permissions.values_mut() {
            granted.remove(id);
        }
        guard
            .role_permissions
            .retain(|_, granted| !granted.is_empty());
        true
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        if guard.users_by_email.contains_key(user.email().as_str()) {
            return Ok(false);
        }
        guard
            .users_by_email
            .insert(user.email().as_str().to_string(), user.id().clone());
        guard.users.insert(user.id().clone(), user);
        Ok(true)
    }

    async fn find_user(&self, id: &UserId) -> std::result::Result<Option<User>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.users.get(id).cloned())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> std::result::Result<Option<User>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .users_by_email
            .get(email)
            .and_then(|id| guard.users.get(id))
            .cloned())
    }

    async fn user_email_exists(&self, email: &str) -> std::result::Result<bool, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.users_by_email.contains_key(email))
    }

    async fn update_user(
        &self,
        id: &UserId,
        apply: ApplyFn<'_, User>,
    ) -> std::result::Result<Updated<User>, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(existing) = guard.users.get(id) else {
            return Ok(Updated::Missing);
        };
        let mut candidate = existing.clone();
        if let Err(error) = apply(&mut candidate) {
            return Ok(Updated::Rejected(error));
        }
        guard.users.insert(id.clone(), candidate.clone());
        Ok(Updated::Applied(candidate))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn insert_role(&self, role: Role) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        if guard.roles_by_name.contains_key(role.name().as_str()) {
            return Ok(false);
        }
        guard
            .roles_by_name
            .insert(role.name().as_str().to_string(), role.id().clone());
        guard.roles.insert(role.id().clone(), role);
        Ok(true)
    }

    async fn find_role(&self, id: &RoleId) -> std::result::Result<Option<Role>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.roles.get(id).cloned())
    }

    async fn find_role_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<Role>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .roles_by_name
            .get(name)
            .and_then(|id| guard.roles.get(id))
            .cloned())
    }

    async fn role_name_exists(&self, name: &str) -> std::result::Result<bool, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.roles_by_name.contains_key(name))
    }

    async fn update_role(
        &self,
        id: &RoleId,
        apply: ApplyFn<'_, Role>,
    ) -> std::result::Result<Updated<Role>, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(existing) = guard.roles.get(id) else {
            return Ok(Updated::Missing);
        };
        let mut candidate = existing.clone();
        if let Err(error) = apply(&mut candidate) {
            return Ok(Updated::Rejected(error));
        }
        guard.roles.insert(id.clone(), candidate.clone());
        Ok(Updated::Applied(candidate))
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn insert_permission(
        &self,
        permission: Permission,
    ) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        if guard
            .permissions_by_name
            .contains_key(permission.name().as_str())
        {
            return Ok(false);
        }
        guard.permissions_by_name.insert(
            permission.name().as_str().to_string(),
            permission.id().clone(),
        );
        guard
            .permissions
            .insert(permission.id().clone(), permission);
        Ok(true)
    }

    async fn find_permission(
        &self,
        id: &PermissionId,
    ) -> std::result::Result<Option<Permission>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.permissions.get(id).cloned())
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<Permission>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .permissions_by_name
            .get(name)
            .and_then(|id| guard.permissions.get(id))
            .cloned())
    }

    async fn permission_name_exists(
        &self,
        name: &str,
    ) -> std::result::Result<bool, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.permissions_by_name.contains_key(name))
    }

    async fn update_permission(
        &self,
        id: &PermissionId,
        apply: ApplyFn<'_, Permission>,
    ) -> std::result::Result<Updated<Permission>, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(existing) = guard.permissions.get(id) else {
            return Ok(Updated::Missing);
        };
        let mut candidate = existing.clone();
        if let Err(error) = apply(&mut candidate) {
            return Ok(Updated::Rejected(error));
        }
        guard.permissions.insert(id.clone(), candidate.clone());
        Ok(Updated::Applied(candidate))
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn insert_user_role(
        &self,
        user: &UserId,
        role: &RoleId,
    ) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        Ok(guard
            .user_roles
            .entry(user.clone())
            .or_default()
            .insert(role.clone()))
    }

    async fn remove_user_role(
        &self,
        user: &UserId,
        role: &RoleId,
    ) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(assigned) = guard.user_roles.get_mut(user) else {
            return Ok(false);
        };
        let removed = assigned.remove(role);
        if assigned.is_empty() {
            guard.user_roles.remove(user);
        }
        Ok(removed)
    }

    async fn user_role_exists(
        &self,
        user: &UserId,
        role: &RoleId,
    ) -> std::result::Result<bool, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .user_roles
            .get(user)
            .is_some_and(|assigned| assigned.contains(role)))
    }

    async fn swap_user_role(
        &self,
        user: &UserId,
        old_role: &RoleId,
        new_role: &RoleId,
    ) -> std::result::Result<SwapOutcome, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(assigned) = guard.user_roles.get_mut(user) else {
            return Ok(SwapOutcome::OldAssignmentMissing);
        };
        if !assigned.contains(old_role) {
            return Ok(SwapOutcome::OldAssignmentMissing);
        }
        if assigned.contains(new_role) {
            return Ok(SwapOutcome::NewAlreadyAssigned);
        }
        assigned.remove(old_role);
        assigned.insert(new_role.clone());
        Ok(SwapOutcome::Swapped)
    }

    async fn insert_role_permission(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        Ok(guard
            .role_permissions
            .entry(role.clone())
            .or_default()
            .insert(permission.clone()))
    }

    async fn remove_role_permission(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> std::result::Result<bool, crate::StoreError> {
        let mut guard = self.inner.write().expect("poisoned lock");
        let Some(granted) = guard.role_permissions.get_mut(role) else {
            return Ok(false);
        };
        let removed = granted.remove(permission);
        if granted.is_empty() {
            guard.role_permissions.remove(role);
        }
        Ok(removed)
    }

    async fn role_permission_exists(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> std::result::Result<bool, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .role_permissions
            .get(role)
            .is_some_and(|granted| granted.contains(permission)))
    }

    async fn user_roles(&self, user: &UserId) -> std::result::Result<Vec<Role>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .user_roles
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|role_id| guard.roles.get(role_id))
            .cloned()
            .collect())
    }

    async fn role_permissions(
        &self,
        role: &RoleId,
    ) -> std::result::Result<Vec<Permission>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .role_permissions
            .get(role)
            .into_iter()
            .flatten()
            .filter_map(|permission_id| guard.permissions.get(permission_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuthorityStore for MemoryStore {
    async fn authority_graph(
        &self,
        user: &UserId,
    ) -> std::result::Result<Option<AuthorityGraph>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard.users.get(user).map(|record| guard.graph_for(record)))
    }

    async fn authority_graph_by_email(
        &self,
        email: &str,
    ) -> std::result::Result<Option<AuthorityGraph>, crate::StoreError> {
        let guard = self.inner.read().expect("poisoned lock");
        Ok(guard
            .users_by_email
            .get(email)
            .and_then(|id| guard.users.get(id))
            .map(|record| guard.graph_for(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Permission, Role, User};
    use crate::types::{EmailAddress, PermissionName, RoleName};
    use futures::executor::block_on;

    fn user(email: &str) -> User {
        User::new(
            "Ada Lovelace",
            EmailAddress::new(email).unwrap(),
            "$argon2id$stub",
        )
        .unwrap()
    }

    fn role(name: &str) -> Role {
        Role::new(RoleName::new(name).unwrap(), "test role").unwrap()
    }

    fn permission(name: &str) -> Permission {
        Permission::new(PermissionName::new(name).unwrap(), "test permission").unwrap()
    }

    #[test]
    fn insert_user_should_enforce_email_uniqueness() {
        let store = MemoryStore::new();

        assert!(block_on(store.insert_user(user("ada@example.com"))).unwrap());
        assert!(!block_on(store.insert_user(user("ada@example.com"))).unwrap());
    }

    #[test]
    fn update_should_not_persist_rejected_mutation() {
        let store = MemoryStore::new();
        let record = role("ROLE_AUDITOR");
        let id = record.id().clone();
        block_on(store.insert_role(record)).unwrap();

        let outcome = block_on(store.update_role(&id, &|role: &mut Role| {
            role.update_description("changed")?;
            Err(crate::Error::InvalidInput("forced failure".to_string()))
        }))
        .unwrap();

        assert!(matches!(outcome, Updated::Rejected(_)));
        let kept = block_on(store.find_role(&id)).unwrap().unwrap();
        assert_eq!(kept.description(), "test role");
    }

    #[test]
    fn swap_should_validate_both_pairs() {
        let store = MemoryStore::new();
        let owner = user("ada@example.com");
        let old_role = role("ROLE_AUDITOR");
        let new_role = role("ROLE_SYSTEM_ADMIN");
        block_on(store.insert_user(owner.clone())).unwrap();
        block_on(store.insert_role(old_role.clone())).unwrap();
        block_on(store.insert_role(new_role.clone())).unwrap();

        let missing =
            block_on(store.swap_user_role(owner.id(), old_role.id(), new_role.id())).unwrap();
        assert_eq!(missing, SwapOutcome::OldAssignmentMissing);

        block_on(store.insert_user_role(owner.id(), old_role.id())).unwrap();
        block_on(store.insert_user_role(owner.id(), new_role.id())).unwrap();
        let duplicate =
            block_on(store.swap_user_role(owner.id(), old_role.id(), new_role.id())).unwrap();
        assert_eq!(duplicate, SwapOutcome::NewAlreadyAssigned);

        block_on(store.remove_user_role(owner.id(), new_role.id())).unwrap();
        let swapped =
            block_on(store.swap_user_role(owner.id(), old_role.id(), new_role.id())).unwrap();
        assert_eq!(swapped, SwapOutcome::Swapped);
        assert!(!block_on(store.user_role_exists(owner.id(), old_role.id())).unwrap());
        assert!(block_on(store.user_role_exists(owner.id(), new_role.id())).unwrap());
    }

    #[test]
    fn remove_role_should_cascade_assignments() {
        let store = MemoryStore::new();
        let owner = user("ada@example.com");
        let record = role("ROLE_AUDITOR");
        let granted = permission("USER_READ");
        block_on(store.insert_user(owner.clone())).unwrap();
        block_on(store.insert_role(record.clone())).unwrap();
        block_on(store.insert_permission(granted.clone())).unwrap();
        block_on(store.insert_user_role(owner.id(), record.id())).unwrap();
        block_on(store.insert_role_permission(record.id(), granted.id())).unwrap();

        assert!(store.remove_role(record.id()));

        assert!(!block_on(store.user_role_exists(owner.id(), record.id())).unwrap());
        assert!(block_on(store.role_permissions(record.id())).unwrap().is_empty());
        let graph = block_on(store.authority_graph(owner.id())).unwrap().unwrap();
        assert!(graph.grants.is_empty());
    }

    #[test]
    fn authority_graph_should_return_whole_snapshot() {
        let store = MemoryStore::new();
        let owner = user("ada@example.com");
        let record = role("ROLE_AUDITOR");
        let granted = permission("USER_READ");
        block_on(store.insert_user(owner.clone())).unwrap();
        block_on(store.insert_role(record.clone())).unwrap();
        block_on(store.insert_permission(granted.clone())).unwrap();
        block_on(store.insert_user_role(owner.id(), record.id())).unwrap();
        block_on(store.insert_role_permission(record.id(), granted.id())).unwrap();

        let graph = block_on(store.authority_graph_by_email("ada@example.com"))
            .unwrap()
            .unwrap();

        assert_eq!(graph.user.id(), owner.id());
        assert_eq!(graph.grants.len(), 1);
        assert_eq!(graph.grants[0].permissions.len(), 1);
    }
}
