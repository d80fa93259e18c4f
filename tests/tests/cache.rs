use tests::*;

use rivet::{tuple, Cache, MapperDef, Memory, Value};

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Barrier,
};

#[test]
fn concurrent_first_requests_compute_once() {
    const THREADS: usize = 32;

    let cache: Cache<&'static str, Vec<u8>> = Cache::new("test");
    let calls = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    let values: Vec<Arc<Vec<u8>>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache.fetch_or_store("key", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        vec![1, 2, 3]
                    })
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|value| Arc::ptr_eq(value, &values[0])));
}

#[test]
fn container_mappers_compile_once_across_threads() {
    let gateway = Arc::new(Memory::new());
    let mut builder = users_and_tasks(gateway);
    // Same steps as `users.entity`, under another relation.
    builder.mapper(MapperDef::new("tasks", "entity").reject(["admin"]));
    let container = assert_ok!(builder.build());

    let users = assert_ok!(container.relation("users"));
    let tasks = assert_ok!(container.relation("tasks"));

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for relation in [&users, &tasks] {
                    let mapper = relation.mappers().unwrap().default_mapper().unwrap();
                    let out = mapper
                        .call(Value::from(tuple! { "id" => 1, "admin" => true }))
                        .unwrap();
                    assert_eq!(out, Value::from(tuple! { "id" => 1 }));
                }
            });
        }
    });

    // One pipeline serves both relations.
    assert_eq!(container.caches().mappers.len(), 1);
    assert!(container.caches().commands.is_empty());
}
