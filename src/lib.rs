//! Lifecycle-gated RBAC engine over a user directory.
//!
//! This crate models users, roles, and permissions sharing a five-state
//! lifecycle, the two association relations between them, and the
//! authority-resolution algorithm that turns a user into the set of role
//! and permission names that user may exercise right now. The default
//! behavior is deny-by-default: only `ACTIVE` entities contribute
//! authority, independent of whether assignment records still exist.
//!
//! Storage and password hashing are pluggable collaborators: implement
//! [`DirectoryStore`] (or enable `memory-store` for the in-memory
//! reference) and [`CredentialHasher`] (or enable `argon2`).
//!
//! # Examples
//!
//! Administering the directory and resolving authorities (enable
//! `memory-store` and `argon2`):
//! ```no_run
//! use std::sync::Arc;
//! use rs_directory::{Directory, EmailAddress, Resolver, RoleName, Status};
//! # #[cfg(all(feature = "memory-store", feature = "argon2"))]
//! # {
//! use rs_directory::{Argon2Hasher, MemoryStore};
//!
//! # futures::executor::block_on(async {
//! let store = MemoryStore::new();
//! let hasher = Arc::new(Argon2Hasher::new());
//! let directory = Directory::new(store.clone(), hasher.clone());
//! let resolver = Resolver::new(store, hasher);
//!
//! let email = EmailAddress::new("ada@example.com")?;
//! let user = directory.create_user("Ada Lovelace", email, "hunter22").await?;
//! let role = directory
//!     .create_role(RoleName::new("ROLE_AUDITOR")?, "Read-only auditors")
//!     .await?;
//! directory.change_user_status(user.id(), Status::Active).await?;
//! directory.change_role_status(role.id(), Status::Active).await?;
//! directory.assign_role_to_user(user.id(), role.id()).await?;
//!
//! let authorities = resolver.resolve(user.id()).await?;
//! assert!(authorities.has_role("ROLE_AUDITOR"));
//! # Ok::<(), rs_directory::Error>(())
//! # });
//! # }
//! ```
#![forbid(unsafe_code)]

mod credential;
mod directory;
mod entity;
mod error;
mod resolver;
mod status;
mod store;
mod types;

#[cfg(feature = "memory-store")]
mod memory_store;

pub use crate::credential::CredentialHasher;
pub use crate::directory::Directory;
pub use crate::entity::{EntityKind, EntityMeta, Permission, Role, User};
pub use crate::error::{CredentialError, Error, ErrorKind, Result, StoreError};
pub use crate::resolver::{Authentication, Authority, AuthoritySet, Decision, Resolver};
pub use crate::status::Status;
pub use crate::store::{
    ApplyFn, AssignmentStore, AuthorityGraph, AuthorityStore, DirectoryStore, PermissionStore,
    RoleGrant, RoleStore, SwapOutcome, Updated, UserStore,
};
pub use crate::types::{EmailAddress, PermissionId, PermissionName, RoleId, RoleName, UserId};

#[cfg(feature = "argon2")]
pub use crate::credential::Argon2Hasher;

#[cfg(feature = "memory-store")]
pub use crate::memory_store::MemoryStore;
