use criterion::{black_box, criterion_group, criterion_main, Criterion};

use meatball::context::ContextResolver;
use meatball::expr::parse;
use meatball::literal::parse_literal;
use meatball::preprocess::Preprocessor;
use meatball::registry::MacroRegistry;
use meatball::value::Value;

const EXPR: &str = "(map upper (filter 'active' (get cfg 'users' (list))))";

fn make_doc(keys: usize) -> String {
    let mut doc = String::from("base: https://cdn.example.com\nport: 8000\n");
    for i in 0..keys {
        doc.push_str(&format!(
            "k{i}:\n  url: (concat base /app{i}.js)\n  next: (+ port {i})\n  tpl: 'js:${{base}}/v{i}'\n  text: plain value {i}\n"
        ));
    }
    doc
}

fn bench_eval(c: &mut Criterion) {
    let registry = MacroRegistry::new();
    let mut ctx = ContextResolver::default();
    ctx.set(
        "cfg",
        parse_literal("{'users': [{'name': 'a', 'active': True}, {'name': 'b', 'active': False}]}")
            .unwrap_or(Value::Null),
    );

    let mut g = c.benchmark_group("expr");
    g.bench_function("parse", |b| b.iter(|| parse(black_box(EXPR))));
    g.bench_function("parse_and_eval", |b| {
        b.iter(|| registry.evaluate_sexpr(black_box(EXPR), &ctx))
    });
    g.finish();

    let pre = Preprocessor::default();
    let small = make_doc(10);
    let large = make_doc(500);

    let mut g = c.benchmark_group("document");
    g.bench_function("small", |b| {
        b.iter(|| {
            let mut ctx = ContextResolver::default();
            pre.process_yaml(black_box(&small), &mut ctx)
        })
    });
    g.bench_function("large", |b| {
        b.iter(|| {
            let mut ctx = ContextResolver::default();
            pre.process_yaml(black_box(&large), &mut ctx)
        })
    });
    g.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
