use criterion::{black_box, criterion_group, criterion_main, Criterion};
use routex::{Dispatcher, Method, RouterConfig};

fn array_router() -> Dispatcher<u32> {
    let mut d = Dispatcher::new(RouterConfig::default());
    for i in 0..8 {
        d.register(Method::Get, &format!("/api/v1/item{}", i), i).unwrap();
    }
    d
}

fn trie_router() -> Dispatcher<u32> {
    let mut d = Dispatcher::new(RouterConfig::default());
    for i in 0..64 {
        d.register(Method::Get, &format!("/api/v1/resource{}", i), i).unwrap();
    }
    d.register(Method::Get, "/api/v1/users/:id/posts/:post", 1000).unwrap();
    d
}

fn dispatch_paths(c: &mut Criterion) {
    // A zero-capacity cache forces every dispatch through the array or trie.
    let uncached = RouterConfig {
        hot_cache_capacity: 0,
        ..RouterConfig::default()
    };

    let mut array = array_router();
    c.bench_function("array_exact_hot", |b| {
        b.iter(|| array.dispatch(Method::Get, black_box("/api/v1/item7")).is_ok())
    });

    let mut cold = Dispatcher::new(uncached.clone());
    for i in 0..8 {
        cold.register(Method::Get, &format!("/api/v1/item{}", i), i).unwrap();
    }
    c.bench_function("array_exact_scan", |b| {
        b.iter(|| cold.dispatch(Method::Get, black_box("/api/v1/item7")).is_ok())
    });

    let mut trie = trie_router();
    c.bench_function("trie_index_exact", |b| {
        b.iter(|| trie.dispatch(Method::Get, black_box("/api/v1/resource63")).is_ok())
    });
    c.bench_function("trie_param_descent", |b| {
        b.iter(|| {
            trie.dispatch(Method::Get, black_box("/api/v1/users/42/posts/7"))
                .map(|m| m.params.len())
        })
    });
    c.bench_function("trie_not_found", |b| {
        b.iter(|| trie.dispatch(Method::Get, black_box("/api/v2/missing")).is_err())
    });
}

criterion_group!(benches, dispatch_paths);
criterion_main!(benches);
