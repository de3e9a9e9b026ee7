//! Performance benchmarks for the Quill unit pipeline.
//!
//! - Build: parse, analysis and code generation of the test scripts and of
//!   generated sources of increasing size
//! - Run: executing already built units
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect phase timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quill::{OptLevel, Unit, UnitConfig};
use std::fmt::Write;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print the average time of every top-level scope.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;
    use std::collections::HashMap;

    let Some(frame_view) = FRAME_VIEW.get() else {
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut timings: HashMap<String, i64> = HashMap::new();
    let mut frames = 0i64;
    for frame in view.recent_frames() {
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        frames += 1;
        for (_, stream_info) in unpacked.thread_streams.iter() {
            let Ok(scopes) = Reader::from_start(&stream_info.stream).read_top_scopes() else {
                continue;
            };
            for scope in scopes {
                if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                    *timings.entry(details.name().to_string()).or_insert(0) += scope.record.duration_ns;
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({frames} frames) ===");
    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg = std::time::Duration::from_nanos((ns / frames.max(1)) as u64);
        println!("  {name:30} {avg:>10.2?} avg");
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

fn build(source: &str, opt_level: OptLevel) -> Unit {
    let mut unit = Unit::with_config(UnitConfig::new().opt_level(opt_level).verifier(false));
    unit.add_source("bench.ql", source).unwrap();
    unit.build().unwrap();
    unit
}

/// A program with `count` classes, each with an overridden method, and a
/// loop calling all of them.
fn generated_source(count: usize) -> String {
    let mut source = String::from("class Base { def value() -> Int { return 0 } }\n");
    for i in 0..count {
        writeln!(
            source,
            "class C{i} < Base {{ var n: Int  def value() -> Int {{ return @n + {i} }} }}"
        )
        .unwrap();
        writeln!(source, "def make{i}() -> Base {{ var c = new C{i}  c.n = {i}  return c }}").unwrap();
    }
    source.push_str("var total = 0\n");
    for i in 0..count {
        writeln!(source, "total = total + make{i}().value()").unwrap();
    }
    source.push_str("total\n");
    source
}

fn script_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("unit/scripts");

    for (name, source) in [
        ("dispatch", include_str!("../test_scripts/dispatch.ql")),
        ("generics", include_str!("../test_scripts/generics.ql")),
        ("recursion", include_str!("../test_scripts/recursion.ql")),
        ("strings", include_str!("../test_scripts/strings.ql")),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let unit = build(black_box(source), OptLevel::None);
                end_profiling_frame();
                black_box(unit.function_count())
            });
        });
    }
    group.finish();
    print_profiling_stats();
}

fn size_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit/generated");
    group.sample_size(20);

    for count in [10, 100, 500] {
        let source = generated_source(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        for opt_level in [OptLevel::None, OptLevel::Speed] {
            let id = BenchmarkId::new(format!("{opt_level:?}"), count);
            group.bench_with_input(id, &source, |b, source| {
                b.iter(|| black_box(build(source, opt_level).function_count()));
            });
        }
    }
    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit/run");

    let loop_source = "var total = 0\nfor (var i = 0; i < 100000; i = i + 1) { total = total + i % 7 }\ntotal";
    let unit = build(loop_source, OptLevel::Speed);
    group.bench_function("loop_100k", |b| b.iter(|| black_box(unit.run().unwrap())));

    let unit = build(include_str!("../test_scripts/recursion.ql"), OptLevel::Speed);
    group.bench_function("mutual_recursion", |b| b.iter(|| black_box(unit.run().unwrap())));

    group.finish();
}

criterion_group!(benches, script_benchmarks, size_benchmarks, run_benchmarks);
criterion_main!(benches);
