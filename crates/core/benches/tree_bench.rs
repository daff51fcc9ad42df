//! Mutation engine and reactive propagation benchmarks

use autoexport_core::{flush, insert, lookup, remove, Computed, FileContext, Node, NodeType, Reaction};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn fresh_root() -> Node {
    let context = FileContext::parse("bench-root", NodeType::Directory);
    Node::directory("bench-root", context, None)
}

fn paths() -> Vec<String> {
    (0..20)
        .flat_map(|d| (0..50).map(move |f| format!("dir{d}/sub/file{f}.ts")))
        .collect()
}

fn bench_tree_operations(c: &mut Criterion) {
    let paths = paths();

    c.bench_function("insert_1000", |b| {
        b.iter(|| {
            let root = fresh_root();
            for path in &paths {
                insert(&root, path, None, None).ok();
            }
            black_box(root)
        });
    });

    let root = fresh_root();
    for path in &paths {
        insert(&root, path, None, None).ok();
    }

    c.bench_function("lookup_1000", |b| {
        b.iter(|| {
            for path in &paths {
                black_box(lookup(&root, path));
            }
        });
    });

    c.bench_function("remove_subtree", |b| {
        b.iter(|| {
            let root = fresh_root();
            for path in &paths {
                insert(&root, path, None, None).ok();
            }
            for d in 0..20 {
                remove(&root, &format!("dir{d}")).ok();
            }
        });
    });
}

fn bench_reactive_propagation(c: &mut Criterion) {
    c.bench_function("coalesced_reaction_100_writes", |b| {
        let root = fresh_root();
        let watched = root.clone();
        let count = Computed::new(move || watched.with_children(|c| c.len()));
        let view = count.clone();
        let _reaction = Reaction::effect(move || {
            black_box(view.get());
        });

        let mut n = 0u64;
        b.iter(|| {
            for _ in 0..100 {
                n += 1;
                insert(&root, &format!("f{n}.ts"), None, None).ok();
            }
            flush();
        });
    });
}

criterion_group!(benches, bench_tree_operations, bench_reactive_propagation);
criterion_main!(benches);
