use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use donorec::{DonorecConfig, OrganizationRecord, RecommendationEngine, StoreConfig};

fn sample_org(id: i64) -> OrganizationRecord {
    // Deterministic spread of coordinates and descriptions.
    OrganizationRecord {
        id,
        latitude: ((id * 37) % 180 - 90) as f64 * 0.9,
        longitude: ((id * 73) % 360 - 180) as f64 * 0.9,
        created_at: Utc
            .timestamp_opt(1_500_000_000 + id * 86_400, 0)
            .unwrap(),
        description: Some(format!("organization {id} mission statement")),
    }
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");

    for size in [100_i64, 1_000, 5_000] {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DonorecConfig {
            store: StoreConfig {
                path: dir.path().join("orgvec.idx"),
            },
            ..Default::default()
        };
        let engine = RecommendationEngine::new(&config).expect("engine");
        for id in 0..size {
            let org = sample_org(id);
            let vector = engine
                .embedder()
                .vectorize(
                    org.latitude,
                    org.longitude,
                    org.created_at,
                    org.description.as_deref().unwrap_or(""),
                )
                .expect("vectorize");
            engine.store().insert(org.id, vector).expect("insert");
        }
        engine.store().write().expect("flush");

        let preference = engine.new_preference(1);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("scan_{size}"), |b| {
            b.iter(|| {
                engine
                    .recommend(black_box(&preference), black_box(10))
                    .expect("recommend")
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nearest);
criterion_main!(benches);
