#![cfg(all(feature = "criterion-bench", feature = "memory-store"))]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use rs_directory::{
    Authority, CredentialHasher, Directory, EmailAddress, MemoryStore, PermissionName, Resolver,
    RoleName, Status, UserId,
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

// Spells an index with uppercase letters so it fits the name patterns.
fn word(index: usize) -> String {
    let mut value = index;
    let mut out = String::new();
    loop {
        out.push(char::from(b'A' + (value % 26) as u8));
        value /= 26;
        if value == 0 {
            break;
        }
    }
    out
}

fn setup_fanout(role_count: usize) -> (Resolver<MemoryStore>, UserId, Authority) {
    let store = MemoryStore::new();
    let hasher = Arc::new(PlainHasher);
    let directory = Directory::new(store.clone(), hasher.clone());
    let resolver = Resolver::new(store, hasher);

    let user = block_on(directory.create_user(
        "Ada Lovelace",
        EmailAddress::new("ada@example.com").unwrap(),
        "hunter22",
    ))
    .unwrap();
    block_on(directory.change_user_status(user.id(), Status::Active)).unwrap();

    let mut required = None;
    for i in 0..role_count {
        let role = block_on(directory.create_role(
            RoleName::new(format!("ROLE_BENCH_{}", word(i)).as_str()).unwrap(),
            "bench role",
        ))
        .unwrap();
        let permission = block_on(directory.create_permission(
            PermissionName::new(format!("BENCH_READ_{}", word(i)).as_str()).unwrap(),
            "bench permission",
        ))
        .unwrap();
        block_on(directory.change_role_status(role.id(), Status::Active)).unwrap();
        block_on(directory.change_permission_status(permission.id(), Status::Active)).unwrap();
        block_on(directory.assign_role_to_user(user.id(), role.id())).unwrap();
        block_on(directory.assign_permission_to_role(role.id(), permission.id())).unwrap();
        required = Some(Authority::Permission(permission.name().clone()));
    }

    (resolver, user.id().clone(), required.expect("at least one role"))
}

fn bench_resolve_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_role_fanout");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    for role_count in [1usize, 8, 32, 128] {
        let (resolver, user, _required) = setup_fanout(role_count);

        let id = BenchmarkId::from_parameter(role_count);
        group.bench_with_input(id, &role_count, |b, _| {
            b.iter(|| {
                let set = block_on(resolver.resolve(&user)).unwrap();
                black_box(set);
            });
        });
    }

    group.finish();
}

fn bench_gate_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_check");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let (resolver, user, required) = setup_fanout(32);
    let set = block_on(resolver.resolve(&user)).unwrap();

    group.bench_function("check_allow", |b| {
        b.iter(|| {
            let decision = set.check(&required);
            black_box(decision);
        });
    });

    let missing = Authority::Role(RoleName::new("ROLE_NOT_GRANTED").unwrap());
    group.bench_function("check_deny", |b| {
        b.iter(|| {
            let decision = set.check(&missing);
            black_box(decision);
        });
    });

    group.finish();
}

fn bench_authenticate(c: &mut Criterion) {
    let mut group = c.benchmark_group("authenticate");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let (resolver, _user, _required) = setup_fanout(8);

    group.bench_function("grant", |b| {
        b.iter(|| {
            let outcome = block_on(resolver.authenticate("ada@example.com", "hunter22")).unwrap();
            black_box(outcome);
        });
    });

    group.bench_function("deny_unknown_email", |b| {
        b.iter(|| {
            let outcome = block_on(resolver.authenticate("bob@example.com", "hunter22")).unwrap();
            black_box(outcome);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_fanout,
    bench_gate_check,
    bench_authenticate
);
criterion_main!(benches);
