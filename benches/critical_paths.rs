//! Criterion benchmarks for sitepack critical paths
//!
//! Benchmarks the operations that scale with project size:
//! - Planner: manual chunk lookup and full module planning
//! - Local image service: decode, resize and re-encode
//! - Pipeline: an in-memory build through all five phases

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use sitepack::assets::{AssetKind, AssetService, LocalImageService, TransformParams};
use sitepack::build::{BuildContext, BuildPipeline, Module, ResolvedSources};
use sitepack::bundle::ChunkPlanner;
use sitepack::config::{default_config, BundlingConfig, ManualChunks};
use std::io::Cursor;
use std::path::PathBuf;

// =============================================================================
// Test Data Generators
// =============================================================================

/// `chunks` manual chunks of `per_chunk` specifiers each
fn make_bundling(chunks: usize, per_chunk: usize) -> BundlingConfig {
    let mut manual = ManualChunks::new();
    for c in 0..chunks {
        manual = manual.with_chunk(
            format!("chunk{}", c),
            (0..per_chunk).map(|m| format!("lib/{}/mod{}.js", c, m)),
        );
    }
    BundlingConfig { manual_chunks: manual }
}

/// Modules covering every manual specifier plus as many unassigned ones
fn make_modules(chunks: usize, per_chunk: usize) -> Vec<Module> {
    let assigned = (0..chunks)
        .flat_map(|c| (0..per_chunk).map(move |m| format!("lib/{}/mod{}.js", c, m)));
    let free = (0..chunks * per_chunk).map(|i| format!("app/{}.js", i));
    assigned
        .chain(free)
        .map(|spec| Module::new(spec, b"export default 1;".to_vec()))
        .collect()
}

fn make_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 128, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("encode bench image");
    out.into_inner()
}

fn make_sources(pages: usize, modules: usize) -> ResolvedSources {
    let mut sources = ResolvedSources::new();
    for i in 0..pages {
        sources = sources.with_page(format!("p{}/index.html", i), format!("<h1>{}</h1>", i));
    }
    for i in 0..modules {
        sources = sources.with_module(format!("js/m{}.js", i), "export {};");
    }
    sources.with_static("robots.txt", "User-agent: *")
}

// =============================================================================
// Planner Benchmarks
// =============================================================================

fn bench_plan_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner/plan_chunk");

    for &chunks in &[4usize, 32, 256] {
        let planner = ChunkPlanner::new(&make_bundling(chunks, 16));
        let hit = format!("lib/{}/mod7.js", chunks / 2);
        group.bench_with_input(BenchmarkId::new("hit", chunks), &hit, |b, spec| {
            b.iter(|| planner.plan_chunk(black_box(spec)))
        });
        group.bench_with_input(BenchmarkId::new("miss", chunks), "app/main.js", |b, spec| {
            b.iter(|| planner.plan_chunk(black_box(spec)))
        });
    }

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner/plan");

    for &chunks in &[4usize, 32, 128] {
        let planner = ChunkPlanner::new(&make_bundling(chunks, 16));
        let modules = make_modules(chunks, 16);
        group.throughput(Throughput::Elements(modules.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunks), &modules, |b, modules| {
            b.iter(|| planner.plan(black_box(modules)))
        });
    }

    group.finish();
}

// =============================================================================
// Asset Service Benchmarks
// =============================================================================

fn bench_local_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("assets/local");
    let service = LocalImageService::new();

    for &size in &[64u32, 256, 1024] {
        let input = make_png(size, size);
        let params = TransformParams { width: Some(size / 2), ..Default::default() };
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("halve", size), &input, |b, input| {
            b.iter(|| service.transform(black_box(input), &params))
        });
    }

    group.finish();
}

// =============================================================================
// Pipeline Benchmarks
// =============================================================================

fn bench_in_memory_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/build");

    for &(pages, modules) in &[(10usize, 10usize), (200, 200)] {
        let sources = make_sources(pages, modules)
            .with_asset("img/logo.png", AssetKind::Image, make_png(32, 32));
        let mut config = default_config();
        config.bundling = BundlingConfig {
            manual_chunks: ManualChunks::new().with_chunk("vendor", ["js/m0.js", "js/m1.js"]),
        };

        group.bench_with_input(
            BenchmarkId::new("pages+modules", pages + modules),
            &sources,
            |b, sources| {
                b.iter(|| {
                    let ctx = BuildContext::new(config.clone(), PathBuf::from("/bench"));
                    BuildPipeline::new(ctx)
                        .expect("pipeline")
                        .with_resolver(sources.clone())
                        .run()
                        .expect("build")
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_plan_chunk, bench_plan, bench_local_image, bench_in_memory_build);
criterion_main!(benches);
