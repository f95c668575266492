use crate::entity::{Permission, Role, User};
use crate::error::{Error, StoreError};
use crate::types::{PermissionId, RoleId, UserId};
use async_trait::async_trait;

/// Mutation closure applied inside the store's transaction boundary.
///
/// The closure is pure over the loaded record; a rejected mutation must not
/// be persisted.
pub type ApplyFn<'a, T> = &'a (dyn Fn(&mut T) -> crate::error::Result<()> + Send + Sync);

/// Outcome of a conditional read-modify-write.
#[derive(Debug)]
pub enum Updated<T> {
    /// No record with the given identifier exists.
    Missing,
    /// The mutation was rejected; nothing was persisted.
    Rejected(Error),
    /// The mutation was applied and persisted; carries the new record.
    Applied(T),
}

/// Outcome of an atomic role swap on a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Old association removed and new association created as one unit.
    Swapped,
    /// The (user, old role) association did not exist; nothing changed.
    OldAssignmentMissing,
    /// The (user, new role) association already existed; nothing changed.
    NewAlreadyAssigned,
}

/// One consistent read of a user's role/permission graph.
///
/// The store must gather the whole graph within a single read transaction so
/// resolution never observes a partially revoked graph. Records carry their
/// status; gating is the resolver's job.
#[derive(Debug, Clone)]
pub struct AuthorityGraph {
    /// The user record, status included.
    pub user: User,
    /// Every role assigned to the user, with that role's permissions.
    pub grants: Vec<RoleGrant>,
}

/// A role assigned to a user, with the permissions the role grants.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Store interface for user records.
#[async_trait]
pub trait UserStore {
    /// Inserts a new user; returns false when the email is already taken.
    /// The uniqueness check and the insert are one atomic unit.
    async fn insert_user(&self, user: User) -> std::result::Result<bool, StoreError>;

    /// Looks up a user by public identifier.
    async fn find_user(&self, id: &UserId) -> std::result::Result<Option<User>, StoreError>;

    /// Looks up a user by email.
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> std::result::Result<Option<User>, StoreError>;

    /// Returns whether a user with the given email exists.
    async fn user_email_exists(&self, email: &str) -> std::result::Result<bool, StoreError>;

    /// Applies a mutation to a user record inside the store's transaction
    /// boundary.
    async fn update_user(
        &self,
        id: &UserId,
        apply: ApplyFn<'_, User>,
    ) -> std::result::Result<Updated<User>, StoreError>;
}

/// Store interface for role records.
#[async_trait]
pub trait RoleStore {
    /// Inserts a new role; returns false when the name is already taken.
    async fn insert_role(&self, role: Role) -> std::result::Result<bool, StoreError>;

    /// Looks up a role by public identifier.
    async fn find_role(&self, id: &RoleId) -> std::result::Result<Option<Role>, StoreError>;

    /// Looks up a role by unique name (case-sensitive exact match).
    async fn find_role_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<Role>, StoreError>;

    /// Returns whether a role with the given name exists.
    async fn role_name_exists(&self, name: &str) -> std::result::Result<bool, StoreError>;

    /// Applies a mutation to a role record inside the store's transaction
    /// boundary.
    async fn update_role(
        &self,
        id: &RoleId,
        apply: ApplyFn<'_, Role>,
    ) -> std::result::Result<Updated<Role>, StoreError>;
}

/// Store interface for permission records.
#[async_trait]
pub trait PermissionStore {
    /// Inserts a new permission; returns false when the name is already
    /// taken.
    async fn insert_permission(
        &self,
        permission: Permission,
    ) -> std::result::Result<bool, StoreError>;

    /// Looks up a permission by public identifier.
    async fn find_permission(
        &self,
        id: &PermissionId,
    ) -> std::result::Result<Option<Permission>, StoreError>;

    /// Looks up a permission by unique name (case-sensitive exact match).
    async fn find_permission_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<Permission>, StoreError>;

    /// Returns whether a permission with the given name exists.
    async fn permission_name_exists(&self, name: &str) -> std::result::Result<bool, StoreError>;

    /// Applies a mutation to a permission record inside the store's
    /// transaction boundary.
    async fn update_permission(
        &self,
        id: &PermissionId,
        apply: ApplyFn<'_, Permission>,
    ) -> std::result::Result<Updated<Permission>, StoreError>;
}

/// Store interface for the two association relations.
///
/// The boolean-returning primitives pair the existence check with the write
/// in one atomic unit, so concurrent duplicate attempts serialize with
/// exactly one winner.
#[async_trait]
pub trait AssignmentStore {
    /// Creates a (user, role) association; returns false when the pair
    /// already exists.
    async fn insert_user_role(
        &self,
        user: &UserId,
        role: &RoleId,
    ) -> std::result::Result<bool, StoreError>;

    /// Deletes a (user, role) association; returns false when the pair does
    /// not exist.
    async fn remove_user_role(
        &self,
        user: &UserId,
        role: &RoleId,
    ) -> std::result::Result<bool, StoreError>;

    /// Returns whether a (user, role) association exists.
    async fn user_role_exists(
        &self,
        user: &UserId,
        role: &RoleId,
    ) -> std::result::Result<bool, StoreError>;

    /// Replaces (user, old) with (user, new) as one atomic unit, re-checking
    /// both pair conditions under the same boundary as the two writes.
    async fn swap_user_role(
        &self,
        user: &UserId,
        old_role: &RoleId,
        new_role: &RoleId,
    ) -> std::result::Result<SwapOutcome, StoreError>;

    /// Creates a (role, permission) association; returns false when the pair
    /// already exists.
    async fn insert_role_permission(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> std::result::Result<bool, StoreError>;

    /// Deletes a (role, permission) association; returns false when the pair
    /// does not exist.
    async fn remove_role_permission(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> std::result::Result<bool, StoreError>;

    /// Returns whether a (role, permission) association exists.
    async fn role_permission_exists(
        &self,
        role: &RoleId,
        permission: &PermissionId,
    ) -> std::result::Result<bool, StoreError>;

    /// Returns the full role records assigned to a user.
    async fn user_roles(&self, user: &UserId) -> std::result::Result<Vec<Role>, StoreError>;

    /// Returns the full permission records granted by a role.
    async fn role_permissions(
        &self,
        role: &RoleId,
    ) -> std::result::Result<Vec<Permission>, StoreError>;
}

/// Store interface for authority resolution reads.
#[async_trait]
pub trait AuthorityStore {
    /// Loads the user's whole role/permission graph in one consistent read.
    async fn authority_graph(
        &self,
        user: &UserId,
    ) -> std::result::Result<Option<AuthorityGraph>, StoreError>;

    /// Loads the graph by user email in one consistent read.
    async fn authority_graph_by_email(
        &self,
        email: &str,
    ) -> std::result::Result<Option<AuthorityGraph>, StoreError>;
}

/// Composite store trait.
pub trait DirectoryStore:
    UserStore + RoleStore + PermissionStore + AssignmentStore + AuthorityStore + Send + Sync
{
}

impl<T> DirectoryStore for T where
    T: UserStore + RoleStore + PermissionStore + AssignmentStore + AuthorityStore + Send + Sync
{
}
