use crate::entity::EntityKind;
use crate::status::Status;
use crate::types::{PermissionId, RoleId, UserId};
use thiserror::Error;

/// Store-layer error type.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Credential-collaborator error type.
pub type CredentialError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    /// Unique-key collision on create.
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: EntityKind, name: String },
    /// Duplicate (user, role) association.
    #[error("role {role} is already assigned to user {user}")]
    RoleAlreadyAssigned { user: UserId, role: RoleId },
    /// Duplicate (role, permission) association.
    #[error("permission {permission} is already assigned to role {role}")]
    PermissionAlreadyAssigned {
        role: RoleId,
        permission: PermissionId,
    },
    /// Expected (user, role) association is absent.
    #[error("user {user} does not hold role {role}")]
    RoleAssignmentNotFound { user: UserId, role: RoleId },
    /// Expected (role, permission) association is absent.
    #[error("role {role} does not grant permission {permission}")]
    PermissionAssignmentNotFound {
        role: RoleId,
        permission: PermissionId,
    },
    /// Status change not permitted from the current state.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    /// Status label is not one of the known states.
    #[error("unknown status: {0}")]
    InvalidStatus(String),
    /// Value fails a structural contract enforced by the core.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Credential collaborator failure.
    #[error("credential error: {0}")]
    Credential(#[source] CredentialError),
    /// Store error wrapper.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

/// Coarse error taxonomy for callers that map outcomes onto a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    AlreadyAssigned,
    AssignmentNotFound,
    InvalidTransition,
    InvalidStatus,
    InvalidInput,
    CredentialFailure,
    StorageFailure,
}

impl Error {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::RoleAlreadyAssigned { .. } | Self::PermissionAlreadyAssigned { .. } => {
                ErrorKind::AlreadyAssigned
            }
            Self::RoleAssignmentNotFound { .. } | Self::PermissionAssignmentNotFound { .. } => {
                ErrorKind::AssignmentNotFound
            }
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::InvalidStatus(_) => ErrorKind::InvalidStatus,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Credential(_) => ErrorKind::CredentialFailure,
            Self::Store(_) => ErrorKind::StorageFailure,
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(kind: EntityKind, name: impl ToString) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.to_string(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}
