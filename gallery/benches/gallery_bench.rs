use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rollcall_gallery::Gallery;
use rollcall_identity::IdentityId;

fn random_unit_vec(dim: usize, seed: u64) -> Vec<f32> {
    let mut v = Vec::with_capacity(dim);
    let mut state = seed;
    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        v.push(((state >> 33) as f32) / (u32::MAX as f32) - 0.5);
    }
    let norm: f64 = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let s = (1.0 / norm) as f32;
        for x in &mut v {
            *x *= s;
        }
    }
    v
}

fn make_cluster(centroid: &[f32], n: usize, noise: f64, base_seed: u64) -> Vec<Vec<f32>> {
    let dim = centroid.len();
    (0..n)
        .map(|i| {
            let mut v = centroid.to_vec();
            let rvec = random_unit_vec(dim, base_seed.wrapping_add(i as u64 * 997));
            for (j, x) in v.iter_mut().enumerate() {
                *x += rvec[j] * noise as f32;
            }
            v
        })
        .collect()
}

fn gallery_items(dim: usize, identities: u128, per_identity: usize) -> Vec<(IdentityId, Vec<Vec<f32>>)> {
    (0..identities)
        .map(|i| {
            let centroid = random_unit_vec(dim, i as u64 + 1);
            (
                IdentityId::from_u128(i + 1),
                make_cluster(&centroid, per_identity, 0.05, i as u64 * 1000),
            )
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let dim = 512;
    let g = Gallery::new(dim);
    g.rebuild_from(gallery_items(dim, 100, 4)).unwrap();
    let query = random_unit_vec(dim, 999);

    c.bench_function("gallery_search_512d_400templates", |b| {
        b.iter(|| {
            let _ = black_box(g.search(black_box(&query), 3).unwrap());
        });
    });
}

fn bench_rebuild(c: &mut Criterion) {
    let dim = 512;
    let items = gallery_items(dim, 100, 4);
    let g = Gallery::new(dim);

    c.bench_function("gallery_rebuild_512d_400templates", |b| {
        b.iter(|| {
            let _ = black_box(g.rebuild_from(black_box(items.clone())).unwrap());
        });
    });
}

criterion_group!(benches, bench_search, bench_rebuild);
criterion_main!(benches);
