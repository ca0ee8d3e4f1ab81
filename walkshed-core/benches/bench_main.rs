use criterion::{Criterion, black_box, criterion_group, criterion_main};
use geo::Point;
use walkshed_core::prelude::*;

/// Square street grid with 80 m blocks
fn grid(side: usize) -> (Network, Vec<NodeId>) {
    let mut network = Network::new();
    let step = 80.0 / walkshed_core::METERS_PER_DEGREE;
    let mut ids = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            #[allow(clippy::cast_precision_loss)]
            let point = Point::new(col as f64 * step, row as f64 * step);
            ids.push(network.add_node(point));
        }
    }
    for row in 0..side {
        for col in 0..side {
            let here = ids[row * side + col];
            if col + 1 < side {
                network.add_edge(here, ids[row * side + col + 1], 80.0).unwrap();
            }
            if row + 1 < side {
                network.add_edge(here, ids[(row + 1) * side + col], 80.0).unwrap();
            }
        }
    }
    (network, ids)
}

fn bench_search(c: &mut Criterion) {
    let (network, ids) = grid(100);
    let origin = ids[ids.len() / 2];

    c.bench_function("search 15 min on 100x100 grid", |b| {
        b.iter(|| search(black_box(&network), origin, black_box(900.0)).unwrap());
    });

    let result = search(&network, origin, 900.0).unwrap();
    c.bench_function("boundary of 15 min walkshed", |b| {
        b.iter(|| boundary_for(black_box(&result), &network, BoundaryPolicy::AngularSort));
    });
}

fn bench_enhanced(c: &mut Criterion) {
    let (network, ids) = grid(100);
    let origin = ids[ids.len() / 2];
    let mut overlay = OverlayManager::new();
    for i in 0..20 {
        let from = network.get_node(ids[i * 450]).unwrap().geometry;
        let to = network.get_node(ids[ids.len() - 1 - i * 450]).unwrap().geometry;
        overlay.add_test_road(from, to);
    }
    let config = OverlayConfig::default();

    c.bench_function("enhanced search with 20 test roads", |b| {
        b.iter(|| {
            compute_enhanced(
                &network,
                &overlay,
                origin,
                black_box(900.0),
                &config,
                &SearchOptions::default(),
            )
            .unwrap()
        });
    });
}

criterion_group!(benches, bench_search, bench_enhanced);
criterion_main!(benches);
