use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::LineString;
use map_raster::{
    render_map, render_tiles, BoundaryBox, GroupRegistry, MapArea, MapData, MapLine, MapNode,
    PlanarPoint, RenderConfig,
};
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

const EXTENT: f64 = 200.;

fn pick<'a>(rng: &mut StdRng, groups: &'a [String]) -> &'a str {
    groups.choose(rng).map(String::as_str).unwrap_or("road")
}

/// 在`EXTENT`见方的区域内随机生成实体
fn random_map(rng: &mut StdRng, registry: &GroupRegistry, count: usize) -> MapData {
    let mut data = MapData::default();
    for id in 0..count as i64 {
        let x = rng.random_range(0.0..EXTENT);
        let y = rng.random_range(0.0..EXTENT);
        let w = rng.random_range(1.0..20.);
        let h = rng.random_range(1.0..20.);
        let ring = LineString::from(vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x, y)]);
        data.areas
            .push(MapArea::new(id, pick(rng, registry.areas()), vec![ring], vec![]));

        let points: Vec<(f64, f64)> = (0..rng.random_range(2..8))
            .map(|_| (rng.random_range(0.0..EXTENT), rng.random_range(0.0..EXTENT)))
            .collect();
        data.lines
            .push(MapLine::new(id, pick(rng, registry.ways()), points));

        let xy = (rng.random_range(0.0..EXTENT), rng.random_range(0.0..EXTENT));
        data.nodes
            .push(MapNode::new(id, pick(rng, registry.nodes()), xy));
    }
    data
}

fn bench_render_map(c: &mut Criterion) {
    let registry = GroupRegistry::osm();
    let mut rng = StdRng::seed_from_u64(42);
    let bbox = BoundaryBox::new(PlanarPoint::new(0., 0.), PlanarPoint::new(EXTENT, EXTENT))
        .expect("valid region");

    let mut group = c.benchmark_group("render_map");
    for count in [100, 1000] {
        let data = random_map(&mut rng, registry, count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| render_map(black_box(data), bbox, &RenderConfig::default(), registry))
        });
    }
    group.finish();
}

fn bench_render_tiles(c: &mut Criterion) {
    let registry = GroupRegistry::osm();
    let mut rng = StdRng::seed_from_u64(7);
    let data = random_map(&mut rng, registry, 1000);
    let tiles = BoundaryBox::new(PlanarPoint::new(0., 0.), PlanarPoint::new(EXTENT, EXTENT))
        .and_then(|bbox| bbox.tiles(50.))
        .expect("valid tiles");

    c.bench_function("render_tiles_16", |b| {
        b.iter(|| render_tiles(black_box(&data), &tiles, &RenderConfig::default(), registry))
    });
}

criterion_group!(benches, bench_render_map, bench_render_tiles);
criterion_main!(benches);
