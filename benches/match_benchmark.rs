use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use routematch::{eskip, MatchOptions, RequestAttributes, Router, SynthesizedRequest};
use std::hint::black_box;

fn route_source(services: usize) -> String {
    let mut source = String::new();
    for i in 0..services {
        source.push_str(&format!(
            "svc{i}_item: Method(\"GET\") && Path(\"/svc{i}/items/:id\") -> \"https://svc{i}.internal\";\n"
        ));
        source.push_str(&format!(
            "svc{i}_json: Path(\"/svc{i}/items/:id\") && Header(\"Accept\", \"application/json\") -> <shunt>;\n"
        ));
        source.push_str(&format!(
            "svc{i}_files: PathSubtree(\"/svc{i}/files\") -> setPath(\"/\") -> <shunt>;\n"
        ));
    }
    source.push_str("dyn: Path(\"/:tenant/health\") -> status(200) -> <shunt>;\n");
    source.push_str("fallback: * -> status(404) -> <shunt>;\n");
    source
}

fn compile_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for services in [10, 100] {
        let source = route_source(services);
        group.throughput(Throughput::Elements((services * 3 + 2) as u64));
        group.bench_function(format!("routes_{}", services * 3 + 2), |b| {
            b.iter(|| black_box(eskip::compile(black_box(&source), &[]).ok()))
        });
    }

    group.finish();
}

fn matching_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("match");

    let routes = eskip::compile(&route_source(100), &[]).unwrap_or_default();
    let router = Router::new(routes);
    let options = MatchOptions::default();

    let requests: Vec<SynthesizedRequest> = [
        RequestAttributes::new("/svc42/items/7"),
        RequestAttributes::new("/svc42/items/7").header("Accept", "application/json"),
        RequestAttributes::new("/svc99/files/a/b/c.txt"),
        RequestAttributes::new("/acme/health"),
        RequestAttributes::new("/unknown/path"),
    ]
    .iter()
    .map(SynthesizedRequest::synthesize)
    .collect();

    group.throughput(Throughput::Elements(1));

    group.bench_function("literal_param", |b| {
        b.iter(|| black_box(router.match_request(&requests[0], &options)))
    });

    group.bench_function("header_constraint", |b| {
        b.iter(|| black_box(router.match_request(&requests[1], &options)))
    });

    group.bench_function("subtree", |b| {
        b.iter(|| black_box(router.match_request(&requests[2], &options)))
    });

    group.bench_function("dynamic_first_segment", |b| {
        b.iter(|| black_box(router.match_request(&requests[3], &options)))
    });

    group.bench_function("fallback", |b| {
        b.iter(|| black_box(router.match_request(&requests[4], &options)))
    });

    group.bench_function("synthesize", |b| {
        let attrs = RequestAttributes::new("/svc42/items/7?expand=1&fields=a,b")
            .method("get")
            .header("Accept", "application/json")
            .header("Host", "api.example.org");
        b.iter(|| black_box(SynthesizedRequest::synthesize(black_box(&attrs))))
    });

    group.finish();
}

criterion_group!(benches, compile_benchmark, matching_benchmark);

criterion_main!(benches);
