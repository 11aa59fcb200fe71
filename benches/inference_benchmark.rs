use std::hint::black_box;

use template_schema::Engine;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const PAGE: &str = r#"
<h1>{{ page.title|default('Untitled')|title }}</h1>
<p>{{ page.author.name|e }} wrote {{ page.posts|length }} posts.</p>
<ul>
  {{- page.posts|map(attribute='title')|join('</li><li>') -}}
</ul>
<footer>{{ page.tags|sort|first }} {{ page.updated|string|truncate(10) }}</footer>
"#;

fn engine_with_template(template: &str) -> Engine {
    let mut engine = Engine::new();
    engine
        .add_template("bench.j2".to_string(), template.to_string())
        .unwrap();
    engine
}

fn infer_page(c: &mut Criterion) {
    c.bench_function("infer page template", |b| {
        let engine = engine_with_template(PAGE);
        b.iter(|| black_box(engine.infer().unwrap()))
    });

    c.bench_function("parse and infer page template", |b| {
        let engine = Engine::new();
        b.iter(|| black_box(engine.infer_template_str("bench.j2", black_box(PAGE)).unwrap()))
    });

    c.bench_function("infer page json schema", |b| {
        let engine = engine_with_template(PAGE);
        b.iter(|| black_box(engine.infer_json_schema().unwrap()))
    });
}

fn infer_long_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter chain length");
    for size in [4, 16, 64, 100].iter() {
        group.bench_with_input(BenchmarkId::new("string filters", size), size, |b, &size| {
            let chain = ["upper", "lower", "title", "trim"]
                .iter()
                .cycle()
                .take(size)
                .copied()
                .collect::<Vec<_>>()
                .join("|");
            let engine = engine_with_template(&format!("{{{{ x|{chain} }}}}"));
            b.iter(|| black_box(engine.infer().unwrap()))
        });
    }
    group.finish();
}

fn infer_many_variables(c: &mut Criterion) {
    let mut group = c.benchmark_group("variables per template");
    for size in [32, 128, 512].iter() {
        group.bench_with_input(BenchmarkId::new("blocks", size), size, |b, &size| {
            let template = (0..size)
                .map(|i| format!("{{{{ row.field{i}|default(0)|abs }}}}"))
                .collect::<Vec<_>>()
                .join("\n");
            let engine = engine_with_template(&template);
            b.iter(|| black_box(engine.infer().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, infer_page, infer_long_chains, infer_many_variables);
criterion_main!(benches);
