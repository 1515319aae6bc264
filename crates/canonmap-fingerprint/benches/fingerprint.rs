use canonmap_fingerprint::{Serializer, SerializerOptions};
use canonmap_key::Key;
use criterion::{criterion_group, criterion_main, Criterion};

fn wide_record(fields: usize) -> Key {
    Key::record((0..fields).map(|i| (format!("field_{i}"), Key::Int(i as i64))))
}

fn nested_list(depth: usize) -> Key {
    let mut k = Key::list([Key::Int(1), Key::str("leaf")]);
    for _ in 0..depth {
        k = Key::list([k]);
    }
    k
}

pub fn fingerprint_repeated_container(c: &mut Criterion) {
    let mut ser = Serializer::new(SerializerOptions::default());
    let key = wide_record(20);

    c.bench_function("fingerprint cold container (uncached)", |b| {
        b.iter(|| {
            let mut ser = Serializer::new(SerializerOptions::default());
            ser.fingerprint(&key)
        })
    });

    // Repeated fingerprinting of the same instance should hit the tiered
    // cache after the promotion threshold, per spec.md §4.2.
    c.bench_function("fingerprint warm container (cached)", |b| {
        b.iter(|| ser.fingerprint(&key))
    });
}

pub fn fingerprint_nested_lists(c: &mut Criterion) {
    let key = nested_list(30);
    c.bench_function("fingerprint deeply nested list", |b| {
        let mut ser = Serializer::new(SerializerOptions::default());
        b.iter(|| ser.fingerprint(&key))
    });
}

criterion_group!(benches, fingerprint_repeated_container, fingerprint_nested_lists);
criterion_main!(benches);
