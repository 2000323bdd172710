use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::{Point, Rect, coord};
use geoterm::prelude::*;
use geoterm::{bits, geohash};

fn benchmark_morton_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("morton_codec");

    group.bench_function("encode", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            let lon = -180.0 + (counter % 3600) as f64 * 0.1;
            let lat = -90.0 + (counter % 1800) as f64 * 0.1;
            counter += 1;
            bits::morton_encode(black_box(lon), black_box(lat))
        })
    });

    let term = bits::morton_encode(-122.4194, 37.7749);
    group.bench_function("decode", |b| {
        b.iter(|| {
            (
                bits::morton_decode_lon(black_box(term)),
                bits::morton_decode_lat(black_box(term)),
            )
        })
    });

    group.bench_function("flip_flop", |b| {
        b.iter(|| bits::flip_flop(black_box(term)))
    });

    group.finish();
}

fn benchmark_geohash_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("geohash_codec");

    for precision in [5u32, 9, 12] {
        group.bench_with_input(
            BenchmarkId::new("string_encode", precision),
            &precision,
            |b, &p| {
                b.iter(|| geohash::string_encode(black_box(37.7749), black_box(-122.4194), p))
            },
        );
    }

    group.bench_function("long_encode", |b| {
        b.iter(|| geohash::long_encode(black_box(37.7749), black_box(-122.4194), 12))
    });

    group.bench_function("decode", |b| {
        b.iter(|| geohash::decode(black_box("9q8yyk8yt")))
    });

    group.finish();
}

fn benchmark_shape_covers(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_covers");

    let shape = QueryShape::rect(Rect::new(
        coord! { x: -10.0, y: -10.0 },
        coord! { x: 10.0, y: 10.0 },
    ))
    .unwrap();

    for levels in [5u32, 8, 10] {
        let tree = PackedQuadTree::new(levels).unwrap();
        group.bench_with_input(
            BenchmarkId::new("streaming_rect", levels),
            &levels,
            |b, _| {
                b.iter(|| {
                    StreamingShapeIterator::new(&tree, shape.clone())
                        .map(|cell| cell.unwrap().token())
                        .count()
                })
            },
        );
    }

    let circle = QueryShape::circle(Point::new(-74.0060, 40.7128), 250_000.0).unwrap();
    let tree = PackedQuadTree::new(9).unwrap();
    group.bench_function("streaming_circle", |b| {
        b.iter(|| {
            StreamingShapeIterator::new(&tree, circle.clone())
                .map(|cell| cell.unwrap().token())
                .count()
        })
    });

    group.finish();
}

fn benchmark_point_terms(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_terms");

    let quad = IndexerBuilder::new().tree_levels(24).build().unwrap();
    let hash = IndexerBuilder::new()
        .tree(TreeKind::Geohash)
        .tree_levels(12)
        .build()
        .unwrap();

    group.bench_function("quadtree", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            let lon = -74.0060 + (counter % 1000) as f64 * 0.001;
            let lat = 40.7128 + (counter % 1000) as f64 * 0.001;
            counter += 1;
            quad.point_term(black_box(&Point::new(lon, lat))).unwrap()
        })
    });

    group.bench_function("geohash", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            let lon = -74.0060 + (counter % 1000) as f64 * 0.001;
            let lat = 40.7128 + (counter % 1000) as f64 * 0.001;
            counter += 1;
            hash.point_term(black_box(&Point::new(lon, lat))).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_morton_codec,
    benchmark_geohash_codec,
    benchmark_shape_covers,
    benchmark_point_terms
);
criterion_main!(benches);
