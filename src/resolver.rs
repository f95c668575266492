use crate::credential::CredentialHasher;
use crate::entity::EntityKind;
use crate::error::{Error, Result};
use crate::status::Status;
use crate::store::{AuthorityGraph, AuthorityStore};
use crate::types::{PermissionName, RoleName, UserId};
use std::collections::HashSet;
use std::sync::Arc;

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Requirement is present in the authority set.
    Allow,
    /// Requirement is absent.
    Deny,
}

/// A capability an operation may require: holding a role or holding a
/// permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Authority {
    Role(RoleName),
    Permission(PermissionName),
}

/// The closed set of role and permission names a user may exercise.
///
/// Produced once per authentication event and consumed by the authorization
/// gate. Set semantics: a permission granted by two roles appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuthoritySet {
    roles: HashSet<RoleName>,
    permissions: HashSet<PermissionName>,
}

impl AuthoritySet {
    /// The empty set: denies everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns whether the set grants nothing.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }

    /// Returns whether the user holds the named role.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    /// Returns whether the user holds the named permission.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    /// Role names in the set.
    pub fn roles(&self) -> &HashSet<RoleName> {
        &self.roles
    }

    /// Permission names in the set.
    pub fn permissions(&self) -> &HashSet<PermissionName> {
        &self.permissions
    }

    /// The authorization gate: allow when the requirement is present,
    /// deny otherwise.
    pub fn check(&self, required: &Authority) -> Decision {
        let granted = match required {
            Authority::Role(name) => self.has_role(name.as_str()),
            Authority::Permission(name) => self.has_permission(name.as_str()),
        };
        if granted { Decision::Allow } else { Decision::Deny }
    }

    /// Applies the three-level status gate to a consistent graph snapshot.
    ///
    /// A non-ACTIVE user contributes nothing; a non-ACTIVE role is skipped
    /// with all its permissions; a non-ACTIVE permission is skipped even
    /// when its role survives. Assignment records are never consulted for
    /// status, so archiving a shared permission revokes it everywhere
    /// without touching any assignment.
    pub(crate) fn from_graph(graph: &AuthorityGraph) -> Self {
        let mut set = Self::empty();
        if graph.user.status() != Status::Active {
            return set;
        }
        for grant in &graph.grants {
            if grant.role.status() != Status::Active {
                continue;
            }
            set.roles.insert(grant.role.name().clone());
            for permission in &grant.permissions {
                if permission.status() != Status::Active {
                    continue;
                }
                set.permissions.insert(permission.name().clone());
            }
        }
        set
    }
}

/// Outcome of an authentication attempt.
///
/// Denials are uniform across unknown email, non-ACTIVE account, and
/// password mismatch; the caller learns nothing about which it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Credentials verified against an ACTIVE account.
    Granted {
        user: UserId,
        authorities: AuthoritySet,
    },
    /// Anything else.
    Denied,
}

/// Authority resolver, invoked once per login/session-establishment event.
///
/// Reads are snapshot-consistent: the store hands over the whole
/// role/permission graph in one read, and the gate is a pure function over
/// it.
pub struct Resolver<S> {
    store: S,
    hasher: Arc<dyn CredentialHasher>,
}

impl<S> Resolver<S>
where
    S: AuthorityStore + Send + Sync,
{
    /// Creates a resolver over a store and a credential collaborator.
    pub fn new(store: S, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Resolves the effective authority set for a user.
    ///
    /// Fails `NotFound` when the user does not exist; a user that exists
    /// but is not ACTIVE resolves to the empty set and must be treated as
    /// unable to authenticate.
    pub async fn resolve(&self, user: &UserId) -> Result<AuthoritySet> {
        let graph = self
            .store
            .authority_graph(user)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(EntityKind::User, user))?;
        let set = AuthoritySet::from_graph(&graph);
        tracing::debug!(
            user = %user,
            roles = set.roles.len(),
            permissions = set.permissions.len(),
            "authorities resolved"
        );
        Ok(set)
    }

    /// Verifies credentials and resolves authorities in one step.
    ///
    /// Collaborator failures are the only errors; every domain-level
    /// rejection answers [`Authentication::Denied`].
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Authentication> {
        let Some(graph) = self
            .store
            .authority_graph_by_email(email)
            .await
            .map_err(Error::from)?
        else {
            return Ok(Authentication::Denied);
        };
        if graph.user.status() != Status::Active {
            tracing::debug!(user = %graph.user.id(), "authentication denied: account not active");
            return Ok(Authentication::Denied);
        }
        let verified = self
            .hasher
            .verify(password, graph.user.credential_hash())
            .map_err(Error::Credential)?;
        if !verified {
            return Ok(Authentication::Denied);
        }
        Ok(Authentication::Granted {
            user: graph.user.id().clone(),
            authorities: AuthoritySet::from_graph(&graph),
        })
    }
}
