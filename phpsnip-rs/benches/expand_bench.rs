use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phpsnip::script::expand::{expand, parse_template};
use phpsnip::script::{Interpreter, Value};

fn make_template(repeats: usize) -> String {
    let chunk = "Hello $nombre, your total is {$precio} USD ($edad years). ";
    chunk.repeat(repeats)
}

fn bench_expand(c: &mut Criterion) {
    let small = make_template(10);
    let large = make_template(1000);

    let mut interp = Interpreter::new();
    interp.set_global_var("nombre", Value::Str("Juan".into()));
    interp.set_global_var("precio", Value::Float(19.99));
    // `$edad` stays unbound so the raw-placeholder path is measured too.

    let small_segs = parse_template(&small);
    let large_segs = parse_template(&large);

    let mut g = c.benchmark_group("template");

    g.bench_function("parse_small", |b| b.iter(|| parse_template(black_box(&small))));
    g.bench_function("parse_large", |b| b.iter(|| parse_template(black_box(&large))));
    g.bench_function("expand_small", |b| {
        b.iter(|| expand(black_box(&small_segs), &interp))
    });
    g.bench_function("expand_large", |b| {
        b.iter(|| expand(black_box(&large_segs), &interp))
    });

    g.finish();
}

fn bench_run(c: &mut Criterion) {
    let src = "function adder($a, $b) { $result = $a + $b; return $result; }\n\
               $total = 0;\n\
               $total = adder($total, 1);\n\
               println(\"total = $total\");";
    c.bench_function("run_adder_script", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new();
            interp.exec_script(black_box(src)).unwrap();
            interp.output.take()
        })
    });
}

criterion_group!(benches, bench_expand, bench_run);
criterion_main!(benches);
