// benches/read_merger.rs
// Criterion benchmarks for mate merging and full pair reconciliation.

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use ferrous_amplicon::amplicon::{AmpliconTemplate, Strand};
use ferrous_amplicon::amplicon_opt::AmpliconOpt;
use ferrous_amplicon::fastq_reader::ReadPair;
use ferrous_amplicon::pairwise::BioAligner;
use ferrous_amplicon::pipeline::reconcile_batch;
use ferrous_amplicon::read_merger::merge_reads;
use ferrous_amplicon::reconcile::reconcile_pair;
use ferrous_amplicon::sequence::reverse_complement;

fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

/// Amplicon of `amplicon_len` bases read from both ends with `read_len` mates
fn make_case(rng: &mut StdRng, amplicon_len: usize, read_len: usize) -> (AmpliconTemplate, ReadPair) {
    let reference = random_dna(rng, amplicon_len);
    let template = AmpliconTemplate::new("bench", "chr1", 1000, &reference, 20, 20, Strand::Forward)
        .expect("valid template");

    let seq1 = reference[..read_len].to_vec();
    let seq2 = reverse_complement(&reference[amplicon_len - read_len..]);
    let pair = ReadPair {
        name: "bench".to_string(),
        qual1: vec![b'I'; seq1.len()],
        qual2: vec![b'I'; seq2.len()],
        seq1,
        seq2,
    };
    (template, pair)
}

fn bench_merge_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_reads");
    let params = AmpliconOpt::default().merge_params();
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);

    for (amplicon_len, read_len) in [(120usize, 100usize), (200, 150), (280, 150), (450, 250)] {
        let (_, pair) = make_case(&mut rng, amplicon_len, read_len);
        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("{}bp_amplicon_{}bp_reads", amplicon_len, read_len), |b| {
            b.iter(|| {
                merge_reads(
                    black_box(&pair.seq1),
                    black_box(&pair.qual1),
                    black_box(&pair.seq2),
                    black_box(&pair.qual2),
                    &params,
                )
            })
        });
    }
    group.finish();
}

fn bench_reconcile_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_pair");
    let opt = AmpliconOpt::default();
    let mut rng = StdRng::seed_from_u64(42);

    for (amplicon_len, read_len) in [(200usize, 150usize), (450, 250)] {
        let (template, pair) = make_case(&mut rng, amplicon_len, read_len);
        let amplicons = vec![template];
        let mut aligner = BioAligner::new(&opt.local_scoring, &opt.global_scoring);

        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("{}bp_amplicon", amplicon_len), |b| {
            b.iter(|| {
                let outcome = reconcile_pair(black_box(&pair), &amplicons, &opt, &mut aligner);
                black_box(outcome);
            })
        });
    }
    group.finish();
}

fn bench_reconcile_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_batch");
    let opt = AmpliconOpt::default();
    let mut rng = StdRng::seed_from_u64(7);

    let (template, pair) = make_case(&mut rng, 200, 150);
    let amplicons = vec![template];
    let batch_len = 1024;

    group.throughput(Throughput::Elements(batch_len as u64));
    group.bench_function("1024_pairs", |b| {
        b.iter_batched(
            || vec![pair.clone(); batch_len],
            |batch| {
                let outcomes = reconcile_batch(&batch, &amplicons, &opt);
                black_box(outcomes.len());
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_merge_reads,
    bench_reconcile_pair,
    bench_reconcile_batch
);
criterion_main!(benches);
