use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pinch_con::extraction::extract_consensuses;
use pinch_con::extraction_config::ExtractionConfigBuilder;
use pinch_con::example_gen::generate_repeat_family;
use pinch_con::sequence_registry::SequenceRegistry;

pub fn bench_extraction(c: &mut Criterion) {
    let alphabet_size = 4;
    let repeat_lens = [300, 3000];
    let num_copies = [10, 100];
    let error_rates = [0.0, 0.05];
    let flank_len = 200;

    let mut benchmark_group = c.benchmark_group("extraction-group");
    benchmark_group.sample_size(10);

    let config = ExtractionConfigBuilder::default()
        .build().unwrap();

    for &rl in repeat_lens.iter() {
        for &nc in num_copies.iter() {
            for &er in error_rates.iter() {
                let (_repeat, records, pinches) = generate_repeat_family(alphabet_size, rl, nc, flank_len, er, 0);
                let registry = SequenceRegistry::from_named_records(records).unwrap();

                let test_label = format!("extraction_{alphabet_size}x{rl}x{nc}_{er}");
                benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                    black_box({
                        extract_consensuses(&registry, pinches.iter().copied(), &config).unwrap()
                    });
                }));
            }
        }
    }

    benchmark_group.finish();
}

criterion_group!(benches, bench_extraction);
criterion_main!(benches);
