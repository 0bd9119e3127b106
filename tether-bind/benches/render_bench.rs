use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tether_bind::*;
use tether_dom::Node;

fn row(i: usize) -> Value {
    Value::map([
        ("label", Value::from(format!("row {i}"))),
        ("kind", Value::from(if i % 2 == 0 { "even" } else { "odd" })),
    ])
}

fn rows(count: usize) -> Value {
    Value::map([("rows", Value::list((0..count).map(row)))])
}

fn table() -> (Rc<Template>, Rc<Template>) {
    let list = each(
        path("rows"),
        vec![element(
            "tr",
            AttributeMap::new().set("class", dynamic_attr(path("kind"))),
            vec![element("td", AttributeMap::new(), vec![dynamic_text(path("label"))])],
        )],
        Some(vec![text("empty")]),
    );
    let page = element("table", AttributeMap::new(), vec![list.clone()]);
    (page, list)
}

fn bench_render_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_string");
    group.sample_size(20);
    let (page, _) = table();
    for &count in &[50usize, 200usize, 1000usize] {
        let ctx = Scope::root(Model::new(rows(count)), Registry::new());
        group.bench_with_input(BenchmarkId::from_parameter(count), &ctx, |b, ctx| {
            b.iter(|| page.render(ctx).len());
        });
    }
    group.finish();
}

fn bench_insert_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_items");
    group.sample_size(20);
    let (page, list) = table();
    for &count in &[50usize, 200usize] {
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| {
                let model = Model::new(rows(count));
                let registry = Registry::new();
                let ctx = Scope::root(model.clone(), registry.clone());
                let root = Node::element("div");
                page.append_to(&root, &ctx);
                let binding = registry.binding_for(&list).expect("list binding");
                model.insert("rows", count / 2, (count..count + 10).map(row).collect());
                binding.insert(count / 2, 10);
                root.child_count()
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().without_plots();
    targets = bench_render_string, bench_insert_items
}
criterion_main!(benches);
