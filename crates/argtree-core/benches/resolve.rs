use argtree_core::{
    BooleanToSwitch, EnumBranch, JoinedFlags, ListToArgs, Literal, MemoryJob, ParamRef,
    PathArgs, PathRole, SwitchFormat, TreeBuilder, ValueWithSwitch,
};
use argtree_test_utils::StaticToolLocator;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn wide_tree(options: usize) -> argtree_core::ConverterTree {
    let mut b = TreeBuilder::new().with_default_format(SwitchFormat::joined("="));
    let mut items = vec![b.add(Literal::new("tool")), b.add(PathArgs::new(PathRole::Input))];
    for i in 0..options {
        let name = format!("opt{i}");
        items.push(b.add(ValueWithSwitch::new(ParamRef::new(&name), &name)));
    }
    let flags = (0..8)
        .map(|i| b.add(BooleanToSwitch::new(ParamRef::new(format!("f{i}")), format!("{i}"))))
        .collect();
    items.push(b.add(JoinedFlags::new(flags)));
    let fast = b.add(Literal::new("--fast"));
    let slow = b.add(Literal::new("--slow"));
    items.push(b.add(EnumBranch::new(
        ParamRef::new("mode").with_default("fast"),
        [("fast", fast), ("slow", slow)],
    )));
    let root = b.add(ListToArgs::new(items));
    b.build(root).expect("valid tree")
}

fn bench_resolve(c: &mut Criterion) {
    let locator = StaticToolLocator::new();
    let mut group = c.benchmark_group("resolve");
    for options in [10, 100, 1000] {
        let tree = wide_tree(options);
        let mut job = MemoryJob::new("bench").with_path(PathRole::Input, None, "in.dat");
        for i in (0..options).step_by(2) {
            job.set_param(format!("opt{i}"), i.to_string());
        }
        for i in 0..8 {
            job.set_param(format!("f{i}"), if i % 3 == 0 { "yes" } else { "no" });
        }
        group.bench_with_input(BenchmarkId::from_parameter(options), &tree, |bench, tree| {
            bench.iter(|| tree.resolve(black_box(&job), &locator).expect("resolves"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
