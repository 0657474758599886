// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use thicket_engine::{ColliderState, CollisionEngine};
use thicket_tree::{DynamicBoxTree, RectExt};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, field: f64, rect_w: f64, rect_h: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (field - rect_w);
        let y0 = rng.next_f64() * (field - rect_h);
        out.push(Rect::new(x0, y0, x0 + rect_w, y0 + rect_h));
    }
    out
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let x0 = cx + (rng.next_f64() - 0.5) * spread;
            let y0 = cy + (rng.next_f64() - 0.5) * spread;
            out.push(Rect::new(x0, y0, x0 + 12.0, y0 + 12.0));
        }
    }
    out
}

type Shared = Rc<RefCell<Vec<Rect>>>;

fn build_tree(rects: &Shared) -> DynamicBoxTree<usize> {
    let cur = Rc::clone(rects);
    let prev = Rc::clone(rects);
    let mut tree = DynamicBoxTree::new(
        move |i: usize| cur.borrow()[i],
        move |i: usize| prev.borrow()[i],
    );
    let n = rects.borrow().len();
    for i in 0..n {
        tree.add(i).unwrap();
    }
    tree
}

fn bench_pair_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_enumeration");
    for &n in &[128usize, 512, 2048] {
        let rects: Shared = Rc::new(RefCell::new(gen_random_rects(n, 1500.0, 20.0, 20.0)));
        let tree = build_tree(&rects);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("tree_n{}", n), |b| {
            b.iter(|| {
                let mut pairs = Vec::new();
                tree.self_pairs(&mut pairs);
                black_box(pairs.len());
            })
        });

        group.bench_function(format!("brute_force_n{}", n), |b| {
            let rects = rects.borrow().clone();
            b.iter(|| {
                let mut hits = 0usize;
                for i in 0..rects.len() {
                    for j in (i + 1)..rects.len() {
                        if rects[i].overlaps_open(rects[j]) {
                            hits += 1;
                        }
                    }
                }
                black_box(hits);
            })
        });
    }

    let rects: Shared = Rc::new(RefCell::new(gen_clustered_rects(32, 32, 60.0)));
    let tree = build_tree(&rects);
    group.bench_function("tree_clustered_1024", |b| {
        b.iter(|| {
            let mut pairs = Vec::new();
            tree.self_pairs(&mut pairs);
            black_box(pairs.len());
        })
    });
    group.finish();
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");
    for &n in &[128usize, 512, 2048] {
        let rects: Shared = Rc::new(RefCell::new(gen_random_rects(n, 1500.0, 20.0, 20.0)));
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("add_all_n{}", n), |b| {
            b.iter_batched(
                || Rc::clone(&rects),
                |rects| {
                    let tree = build_tree(&rects);
                    black_box(tree.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_engine_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");
    for &n in &[64usize, 256, 1024] {
        let field = 1500.0;
        let kinetic = gen_random_rects(n, field, 20.0, 20.0);
        let walls = gen_random_rects(n / 4, field, 40.0, 40.0);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("jitter_update_n{}", n), |b| {
            let mut engine = CollisionEngine::new(Rect::new(0.0, 0.0, field + 100.0, field + 100.0));
            let ids: Vec<_> = kinetic
                .iter()
                .map(|&r| engine.insert(&ColliderState::new(r)).unwrap())
                .collect();
            for &r in &walls {
                engine.insert(&ColliderState::new_static(r)).unwrap();
            }
            engine.update();

            let mut rng = Rng::new(0xBADC_F00D_1234_5678);
            b.iter(|| {
                for &id in &ids {
                    let r = engine.bounds(id).unwrap();
                    let dx = (rng.next_f64() - 0.5) * 2.0;
                    let dy = (rng.next_f64() - 0.5) * 2.0;
                    engine
                        .set_bounds(id, Rect::new(r.x0 + dx, r.y0 + dy, r.x1 + dx, r.y1 + dy))
                        .unwrap();
                }
                engine.update();
                black_box(engine.collisions().len());
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pair_enumeration,
    bench_tree_build,
    bench_engine_tick
);
criterion_main!(benches);
