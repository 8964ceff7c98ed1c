use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cds::{DataArray, DataType, Hierarchy};

fn var_data_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("var_data_append");
    for range in [16usize, 256, 4096] {
        let sample = DataArray::from(vec![1.5f32; range]);
        group.throughput(Throughput::Elements((range * 256) as u64));
        group.bench_function(BenchmarkId::new("set_var_data", range), |b| {
            b.iter(|| {
                let mut hierarchy = Hierarchy::new();
                let root = hierarchy.define_group(None, "root").unwrap();
                hierarchy.define_dim(root, "time", 0, true).unwrap();
                hierarchy.define_dim(root, "range", range, false).unwrap();
                let var = hierarchy
                    .define_var(root, "v", DataType::Float, &["time", "range"])
                    .unwrap();
                for sample_start in 0..256 {
                    hierarchy.set_var_data(var, &sample, sample_start, None).unwrap();
                }
                hierarchy
            });
        });
    }
    group.finish();
}

fn var_data_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("var_data_read");
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.define_group(None, "root").unwrap();
    hierarchy.define_dim(root, "time", 0, true).unwrap();
    let var = hierarchy.define_var(root, "v", DataType::Short, &["time"]).unwrap();
    hierarchy
        .define_att(var.into(), "missing_value", DataArray::from(vec![-9999i16]))
        .unwrap();
    let size = 1usize << 20;
    let data = DataArray::from((0..size).map(|i| (i % 30000) as i16).collect::<Vec<i16>>());
    hierarchy.set_var_data(var, &data, 0, None).unwrap();

    group.throughput(Throughput::Elements(size as u64));
    group.bench_function("get_var_data_double", |b| {
        b.iter(|| {
            hierarchy
                .get_var_data(var, DataType::Double, 0, None, None)
                .unwrap()
        });
    });
    group.bench_function("var_samples", |b| {
        b.iter(|| hierarchy.var_samples::<i16>(var, 0, None).unwrap().len());
    });
    group.finish();
}

criterion_group!(benches, var_data_append, var_data_read);
criterion_main!(benches);
