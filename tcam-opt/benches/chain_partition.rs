use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tcam_filter::Filter;
use tcam_opt::min_chain_partition;

fn ladder_filters(n: usize) -> Vec<Filter> {
    (0..n)
        .map(|i| {
            let width = n;
            let mut value = vec![false; width];
            let mut mask = vec![false; width];
            for bit in 0..=i {
                mask[bit] = true;
            }
            Filter::new(&value, &mask).unwrap()
        })
        .collect()
}

pub fn chain_partition(c: &mut Criterion) {
    let filters = ladder_filters(64);
    c.bench_function("min_chain_partition (single chain, width 64)", |b| {
        b.iter(|| min_chain_partition(black_box(&filters)))
    });
}

criterion_group!(benches, chain_partition);
criterion_main!(benches);
