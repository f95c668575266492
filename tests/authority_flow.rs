#![cfg(feature = "memory-store")]

use futures::executor::block_on;
use rs_directory::{
    Authentication, CredentialHasher, Directory, EmailAddress, Error, MemoryStore, Permission,
    PermissionName, Resolver, Role, RoleName, Status, User,
};
use std::sync::Arc;

struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, rs_directory::CredentialError> {
        Ok(format!("plain${password}"))
    }

    fn verify(
        &self,
        password: &str,
        credential_hash: &str,
    ) -> Result<bool, rs_directory::CredentialError> {
        Ok(credential_hash == format!("plain${password}"))
    }
}

fn setup() -> (Directory<MemoryStore>, Resolver<MemoryStore>) {
    let store = MemoryStore::new();
    let hasher = Arc::new(PlainHasher);
    (
        Directory::new(store.clone(), hasher.clone()),
        Resolver::new(store, hasher),
    )
}

fn active_user(directory: &Directory<MemoryStore>, email: &str) -> User {
    let user = block_on(directory.create_user(
        "Ada Lovelace",
        EmailAddress::new(email).unwrap(),
        "hunter22",
    ))
    .unwrap();
    block_on(directory.change_user_status(user.id(), Status::Active)).unwrap()
}

fn active_role(directory: &Directory<MemoryStore>, name: &str) -> Role {
    let role = block_on(directory.create_role(RoleName::new(name).unwrap(), "test role")).unwrap();
    block_on(directory.change_role_status(role.id(), Status::Active)).unwrap()
}

fn active_permission(directory: &Directory<MemoryStore>, name: &str) -> Permission {
    let permission = block_on(
        directory.create_permission(PermissionName::new(name).unwrap(), "test permission"),
    )
    .unwrap();
    block_on(directory.change_permission_status(permission.id(), Status::Active)).unwrap()
}

#[test]
fn status_gate_should_propagate_through_the_whole_graph() {
    let (directory, resolver) = setup();

    let user = active_user(&directory, "ada@example.com");
    let role = active_role(&directory, "ROLE_AUDITOR");
    let permission = active_permission(&directory, "USER_READ");
    block_on(directory.assign_role_to_user(user.id(), role.id())).unwrap();
    block_on(directory.assign_permission_to_role(role.id(), permission.id())).unwrap();

    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.has_role("ROLE_AUDITOR"));
    assert!(set.has_permission("USER_READ"));

    // Retiring the shared permission revokes it everywhere at once, without
    // touching any assignment record.
    block_on(directory.change_permission_status(permission.id(), Status::Inactive)).unwrap();
    block_on(directory.change_permission_status(permission.id(), Status::Archived)).unwrap();
    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.has_role("ROLE_AUDITOR"));
    assert!(!set.has_permission("USER_READ"));

    block_on(directory.change_user_status(user.id(), Status::Suspended)).unwrap();
    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.is_empty());
}

#[test]
fn revoke_should_remove_authority_on_next_resolve() {
    let (directory, resolver) = setup();

    let user = active_user(&directory, "ada@example.com");
    let role = active_role(&directory, "ROLE_AUDITOR");
    let permission = active_permission(&directory, "USER_READ");
    block_on(directory.assign_role_to_user(user.id(), role.id())).unwrap();
    block_on(directory.assign_permission_to_role(role.id(), permission.id())).unwrap();

    block_on(directory.revoke_user_role(user.id(), role.id())).unwrap();

    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.is_empty());

    let result = block_on(directory.revoke_user_role(user.id(), role.id()));
    assert!(matches!(result, Err(Error::RoleAssignmentNotFound { .. })));
}

#[test]
fn permission_granted_by_two_roles_should_survive_one_revocation() {
    let (directory, resolver) = setup();

    let user = active_user(&directory, "ada@example.com");
    let auditor = active_role(&directory, "ROLE_AUDITOR");
    let admin = active_role(&directory, "ROLE_SYSTEM_ADMIN");
    let permission = active_permission(&directory, "USER_READ");
    block_on(directory.assign_role_to_user(user.id(), auditor.id())).unwrap();
    block_on(directory.assign_role_to_user(user.id(), admin.id())).unwrap();
    block_on(directory.assign_permission_to_role(auditor.id(), permission.id())).unwrap();
    block_on(directory.assign_permission_to_role(admin.id(), permission.id())).unwrap();

    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.has_permission("USER_READ"));
    assert_eq!(set.permissions().len(), 1);

    block_on(directory.revoke_permission_from_role(auditor.id(), permission.id())).unwrap();
    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.has_permission("USER_READ"));
}

#[test]
fn concurrent_duplicate_assignments_should_have_exactly_one_winner() {
    let (directory, _) = setup();
    let directory = Arc::new(directory);

    let user = active_user(&directory, "ada@example.com");
    let role = active_role(&directory, "ROLE_AUDITOR");

    let threads = 8;
    let mut joins = Vec::with_capacity(threads);
    for _ in 0..threads {
        let directory = Arc::clone(&directory);
        let user_id = user.id().clone();
        let role_id = role.id().clone();
        joins.push(std::thread::spawn(move || {
            block_on(directory.assign_role_to_user(&user_id, &role_id))
        }));
    }

    let mut wins = 0;
    let mut duplicates = 0;
    for join in joins {
        match join.join().expect("thread panicked") {
            Ok(()) => wins += 1,
            Err(Error::RoleAlreadyAssigned { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(duplicates, threads - 1);
    let roles = block_on(directory.user_roles(user.id())).unwrap();
    assert_eq!(roles.len(), 1);
}

#[test]
fn replace_should_never_leave_old_and_new_together() {
    let (directory, resolver) = setup();

    let user = active_user(&directory, "ada@example.com");
    let old_role = active_role(&directory, "ROLE_AUDITOR");
    let new_role = active_role(&directory, "ROLE_SYSTEM_ADMIN");
    block_on(directory.assign_role_to_user(user.id(), old_role.id())).unwrap();

    block_on(directory.replace_user_role(user.id(), old_role.id(), new_role.id())).unwrap();

    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(!set.has_role("ROLE_AUDITOR"));
    assert!(set.has_role("ROLE_SYSTEM_ADMIN"));
    assert_eq!(set.roles().len(), 1);
}

#[test]
fn cascade_removal_of_a_role_should_clear_resolution() {
    let store = MemoryStore::new();
    let hasher = Arc::new(PlainHasher);
    let directory = Directory::new(store.clone(), hasher.clone());
    let resolver = Resolver::new(store.clone(), hasher);

    let user = active_user(&directory, "ada@example.com");
    let role = active_role(&directory, "ROLE_AUDITOR");
    let permission = active_permission(&directory, "USER_READ");
    block_on(directory.assign_role_to_user(user.id(), role.id())).unwrap();
    block_on(directory.assign_permission_to_role(role.id(), permission.id())).unwrap();

    assert!(store.remove_role(role.id()));

    let set = block_on(resolver.resolve(user.id())).unwrap();
    assert!(set.is_empty());
    let result = block_on(directory.find_role(role.id()));
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[test]
fn authenticate_should_gate_on_status_and_credentials() {
    let (directory, resolver) = setup();

    let user = active_user(&directory, "ada@example.com");
    let role = active_role(&directory, "ROLE_AUDITOR");
    block_on(directory.assign_role_to_user(user.id(), role.id())).unwrap();

    let granted = block_on(resolver.authenticate("ada@example.com", "hunter22")).unwrap();
    assert!(matches!(granted, Authentication::Granted { .. }));

    let wrong = block_on(resolver.authenticate("ada@example.com", "wrong")).unwrap();
    assert_eq!(wrong, Authentication::Denied);

    block_on(directory.change_user_status(user.id(), Status::Inactive)).unwrap();
    let inactive = block_on(resolver.authenticate("ada@example.com", "hunter22")).unwrap();
    assert_eq!(inactive, Authentication::Denied);
}
