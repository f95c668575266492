use crate::error::{Error, Result};
use crate::status::Status;
use crate::types::{EmailAddress, PermissionId, PermissionName, RoleId, RoleName, UserId};
use chrono::{DateTime, Utc};
use std::fmt;

const FULL_NAME_MAX_LEN: usize = 100;
const CREDENTIAL_HASH_MAX_LEN: usize = 255;
const DESCRIPTION_MAX_LEN: usize = 100;

/// Entity kind tag used in error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    User,
    Role,
    Permission,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::User => "user",
            EntityKind::Role => "role",
            EntityKind::Permission => "permission",
        })
    }
}

/// Common record metadata embedded by value in every entity.
///
/// The public identifier is assigned once at creation and never changes;
/// `updated_at` is re-stamped by every successful mutation. Surrogate row
/// keys are a persistence concern and do not appear here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityMeta<Id> {
    public_id: Id,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<Id> EntityMeta<Id> {
    fn new(public_id: Id) -> Self {
        let now = Utc::now();
        Self {
            public_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// The public identifier, assigned once at creation.
    pub fn public_id(&self) -> &Id {
        &self.public_id
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last-modified timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_bounded(value: &str, what: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{what} must not be blank")));
    }
    if value.len() > max {
        return Err(Error::InvalidInput(format!(
            "{what} exceeds maximum length of {max}"
        )));
    }
    Ok(())
}

/// A directory user: holds zero or more roles through assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    meta: EntityMeta<UserId>,
    full_name: String,
    email: EmailAddress,
    credential_hash: String,
    status: Status,
}

impl User {
    /// Creates a new user in `PENDING` status with a fresh public id.
    ///
    /// The credential hash is opaque to the directory; hashing is the
    /// credential collaborator's job.
    pub fn new(
        full_name: impl Into<String>,
        email: EmailAddress,
        credential_hash: impl Into<String>,
    ) -> Result<Self> {
        let full_name = full_name.into();
        let credential_hash = credential_hash.into();
        validate_bounded(&full_name, "full name", FULL_NAME_MAX_LEN)?;
        validate_bounded(
            &credential_hash,
            "credential hash",
            CREDENTIAL_HASH_MAX_LEN,
        )?;
        Ok(Self {
            meta: EntityMeta::new(UserId::generate()),
            full_name,
            email,
            credential_hash,
            status: Status::Pending,
        })
    }

    pub fn id(&self) -> &UserId {
        &self.meta.public_id
    }

    /// Record metadata: public id and timestamps.
    pub fn meta(&self) -> &EntityMeta<UserId> {
        &self.meta
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Immutable after creation.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at
    }

    /// Replaces the full name; fails `InvalidInput` on a blank or oversized
    /// value and leaves the record untouched.
    pub fn update_full_name(&mut self, full_name: impl Into<String>) -> Result<()> {
        let full_name = full_name.into();
        validate_bounded(&full_name, "full name", FULL_NAME_MAX_LEN)?;
        self.full_name = full_name;
        self.meta.touch();
        Ok(())
    }

    /// Replaces the opaque credential hash.
    pub fn change_credential_hash(&mut self, credential_hash: impl Into<String>) -> Result<()> {
        let credential_hash = credential_hash.into();
        validate_bounded(
            &credential_hash,
            "credential hash",
            CREDENTIAL_HASH_MAX_LEN,
        )?;
        self.credential_hash = credential_hash;
        self.meta.touch();
        Ok(())
    }

    /// Moves the user to `target`; fails `InvalidTransition` when the
    /// lifecycle machine forbids the move.
    pub fn change_status(&mut self, target: Status) -> Result<()> {
        self.status = self.status.transition(target)?;
        self.meta.touch();
        Ok(())
    }
}

/// A role: a named grant bundle assignable to users.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Role {
    meta: EntityMeta<RoleId>,
    name: RoleName,
    description: String,
    status: Status,
}

impl Role {
    /// Creates a new role in `PENDING` status with a fresh public id.
    pub fn new(name: RoleName, description: impl Into<String>) -> Result<Self> {
        let description = description.into();
        validate_bounded(&description, "role description", DESCRIPTION_MAX_LEN)?;
        Ok(Self {
            meta: EntityMeta::new(RoleId::generate()),
            name,
            description,
            status: Status::Pending,
        })
    }

    pub fn id(&self) -> &RoleId {
        &self.meta.public_id
    }

    /// Record metadata: public id and timestamps.
    pub fn meta(&self) -> &EntityMeta<RoleId> {
        &self.meta
    }

    /// Immutable after creation.
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at
    }

    pub fn update_description(&mut self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        validate_bounded(&description, "role description", DESCRIPTION_MAX_LEN)?;
        self.description = description;
        self.meta.touch();
        Ok(())
    }

    pub fn change_status(&mut self, target: Status) -> Result<()> {
        self.status = self.status.transition(target)?;
        self.meta.touch();
        Ok(())
    }
}

/// A permission: a named capability grantable through roles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permission {
    meta: EntityMeta<PermissionId>,
    name: PermissionName,
    description: String,
    status: Status,
}

impl Permission {
    /// Creates a new permission in `PENDING` status with a fresh public id.
    pub fn new(name: PermissionName, description: impl Into<String>) -> Result<Self> {
        let description = description.into();
        validate_bounded(&description, "permission description", DESCRIPTION_MAX_LEN)?;
        Ok(Self {
            meta: EntityMeta::new(PermissionId::generate()),
            name,
            description,
            status: Status::Pending,
        })
    }

    pub fn id(&self) -> &PermissionId {
        &self.meta.public_id
    }

    /// Record metadata: public id and timestamps.
    pub fn meta(&self) -> &EntityMeta<PermissionId> {
        &self.meta
    }

    /// Immutable after creation.
    pub fn name(&self) -> &PermissionName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at
    }

    pub fn update_description(&mut self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        validate_bounded(&description, "permission description", DESCRIPTION_MAX_LEN)?;
        self.description = description;
        self.meta.touch();
        Ok(())
    }

    pub fn change_status(&mut self, target: Status) -> Result<()> {
        self.status = self.status.transition(target)?;
        self.meta.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "Ada Lovelace",
            EmailAddress::new("ada@example.com").unwrap(),
            "$argon2id$stub",
        )
        .unwrap()
    }

    #[test]
    fn new_user_should_start_pending_with_fresh_id() {
        let first = user();
        let second = user();

        assert_eq!(first.status(), Status::Pending);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.meta().public_id(), first.id());
        assert_eq!(first.created_at(), first.updated_at());
    }

    #[test]
    fn update_full_name_should_reject_blank_and_keep_record() {
        let mut user = user();
        let before = user.full_name().to_string();

        let result = user.update_full_name("   ");

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(user.full_name(), before);
    }

    #[test]
    fn update_full_name_should_restamp_updated_at() {
        let mut user = user();
        let created = user.created_at();

        user.update_full_name("Ada King").unwrap();

        assert_eq!(user.full_name(), "Ada King");
        assert_eq!(user.created_at(), created);
        assert!(user.updated_at() >= created);
    }

    #[test]
    fn change_status_should_follow_the_machine() {
        let mut role = Role::new(RoleName::new("ROLE_SYSTEM_ADMIN").unwrap(), "Admins").unwrap();

        role.change_status(Status::Active).unwrap();
        assert_eq!(role.status(), Status::Active);

        let result = role.change_status(Status::Archived);
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        assert_eq!(role.status(), Status::Active);
    }

    #[test]
    fn oversized_description_should_be_rejected() {
        let name = PermissionName::new("USER_READ").unwrap();
        let result = Permission::new(name, "x".repeat(101));

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
