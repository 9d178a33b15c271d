//! End-to-end tests for the alignment run: amplicon list + paired FASTQ in,
//! SAM + mapping stats out.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use ferrous_amplicon::amplicon_opt::AmpliconOpt;
use ferrous_amplicon::pipeline::{AlignJob, run_alignment};
use ferrous_amplicon::sequence::reverse_complement;
use ferrous_amplicon::stats::AmpliconStat;

const REFERENCE: &str = "GCTAAAGACAATTACATAACATACACGTCAGCACGAAACTTGTTGGCCCAGTGTGAATCG";
const REPEAT: &str = "GGTGCCCAGCCGCGCTATGTGTGTGTGTGTGTGTGTGTGTGTGTGTGTGTGCGTGCAATCACCGGCATAA";
const NAME: &str = "M00766:51:000000000-A3FNU:1:1101:15589";

struct Pair {
    seq1: Vec<u8>,
    seq2: Vec<u8>,
}

/// Mate 1 reads the first 46 bases, mate 2 the last 46 from the other strand
fn pair_from(source: &str) -> Pair {
    let source = source.as_bytes();
    Pair {
        seq1: source[..46].to_vec(),
        seq2: reverse_complement(&source[14..]),
    }
}

fn read_name(i: usize) -> String {
    format!("{}:{}", NAME, 1000 + i)
}

fn write_mate(out: &mut impl Write, pairs: &[Pair], mate: u8) {
    for (i, pair) in pairs.iter().enumerate() {
        let seq = if mate == 1 { &pair.seq1 } else { &pair.seq2 };
        writeln!(out, "@{} {}:N:0:ACAGTG", read_name(i), mate).unwrap();
        out.write_all(seq).unwrap();
        writeln!(out, "\n+").unwrap();
        out.write_all(&vec![b'I'; seq.len()]).unwrap();
        writeln!(out).unwrap();
    }
}

fn write_fastqs(dir: &Path, pairs: &[Pair]) -> (PathBuf, PathBuf) {
    let r1 = dir.join("S1_R1.fastq");
    let r2 = dir.join("S1_R2.fastq");
    write_mate(&mut File::create(&r1).unwrap(), pairs, 1);
    write_mate(&mut File::create(&r2).unwrap(), pairs, 2);
    (r1, r2)
}

fn write_list(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("amplicons.txt");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "@SQ\tSN:chr1\tLN:248956422").unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}

fn job(dir: &Path, amplicons: PathBuf, read1: PathBuf, read2: PathBuf) -> AlignJob {
    AlignJob {
        amplicons,
        read1,
        read2,
        prefix: dir.join("S1").to_string_lossy().into_owned(),
        command_line: "ferrous-amplicon align amplicons.txt S1_R1.fastq S1_R2.fastq S1".to_string(),
    }
}

fn sam_records(job: &AlignJob) -> Vec<Vec<String>> {
    fs::read_to_string(job.sam_path())
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('@'))
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect()
}

#[test]
fn test_forward_amplicons_with_discards() {
    let dir = TempDir::new().unwrap();
    let list = write_list(
        dir.path(),
        &[
            format!("A1\tchr1\t1000\t{}\t20\t20\t+", REFERENCE),
            format!("STR\tchr1\t5000\t{}\t20\t20\t+", REPEAT),
        ],
    );

    let mut no_primer = pair_from(REFERENCE);
    no_primer.seq1[19] = b'G';
    let pairs = vec![
        pair_from(REFERENCE),
        pair_from(REFERENCE),
        Pair {
            seq1: REPEAT.as_bytes()[..47].to_vec(),
            seq2: reverse_complement(&REPEAT.as_bytes()[25..]),
        },
        no_primer,
    ];
    let (r1, r2) = write_fastqs(dir.path(), &pairs);
    let job = job(dir.path(), list, r1, r2);

    let stats = run_alignment(&job, &AmpliconOpt::default()).unwrap();
    assert_eq!(stats.total_pairs, 4);
    assert_eq!(stats.primer_matched, 3);
    assert_eq!(stats.usable, 3);
    assert_eq!(stats.unmerged(), 1);
    assert_eq!(stats.mapped, 2);
    assert_eq!(stats.discards.total(), 2);

    let sam = fs::read_to_string(job.sam_path()).unwrap();
    let header: Vec<&str> = sam.lines().take_while(|l| l.starts_with('@')).collect();
    assert_eq!(header.len(), 4);
    assert_eq!(header[0], "@SQ\tSN:chr1\tLN:248956422");
    assert_eq!(header[1], "@RG\tID:S1_A3FNU\tSM:S1\tPL:ILLUMINA\tLB:S1");
    assert!(header[2].starts_with("@PG\tID:ferrous-amplicon"));

    let records = sam_records(&job);
    assert_eq!(records.len(), 2);
    for (i, rec) in records.iter().enumerate() {
        assert_eq!(rec[0], read_name(i));
        assert_eq!(&rec[1..9], ["0", "chr1", "1020", "60", "20S20M20S", "*", "0", "0"]);
        assert_eq!(rec[9], REFERENCE);
        assert_eq!(rec[10].len(), REFERENCE.len());
        assert_eq!(&rec[11..], ["RG:Z:S1_A3FNU", "NM:i:0", "AS:i:60", "CO:Z:A1"]);
    }

    let report = fs::read_to_string(job.stats_path()).unwrap();
    let expected = "\
#ID:S1_A3FNU
#CL:ferrous-amplicon align amplicons.txt S1_R1.fastq S1_R2.fastq S1
";
    assert!(report.starts_with(expected), "{}", report);
    assert!(report.contains("#TotalReads:4\n"));
    assert!(report.contains("#NMaskedPairs:0\n"));
    assert!(report.contains("#PrimerMatchedPairs:3\n"));
    assert!(report.contains("#UsablePairs:3\n"));
    assert!(report.contains("#UnmergedPairs:1 33.33%\n"));
    assert!(report.contains("#TotalAlignedPairs:2 66.67%\n"));
    assert!(report.ends_with(
        "#Amplicon\tUsableReads\tMergedReads\tMappedReads\nA1\t2\t2\t2\nSTR\t1\t0\t0\n"
    ));
}

#[test]
fn test_adapter_read_through() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &[format!("A1\tchr1\t1000\t{}\t20\t20\t+", REFERENCE)]);
    let adapter = b"AGATCGGAAGAGCACACGTC";

    let mut seq1 = REFERENCE.as_bytes().to_vec();
    seq1.extend_from_slice(adapter);
    let mut seq2 = reverse_complement(REFERENCE.as_bytes());
    seq2.extend_from_slice(adapter);
    let (r1, r2) = write_fastqs(dir.path(), &[Pair { seq1, seq2 }]);
    let job = job(dir.path(), list, r1, r2);

    let stats = run_alignment(&job, &AmpliconOpt::default()).unwrap();
    assert_eq!(stats.mapped, 1);

    let records = sam_records(&job);
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][1..6], ["0", "chr1", "1020", "60", "20S20M20S"]);
    assert_eq!(records[0][9], REFERENCE);
    assert_eq!(records[0][12], "NM:i:0");
}

#[test]
fn test_reverse_amplicon() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &[format!("REV\tchr1\t5000\t{}\t20\t18\t-", REFERENCE)]);
    let (r1, r2) = write_fastqs(dir.path(), &[pair_from(REFERENCE)]);
    let job = job(dir.path(), list, r1, r2);

    run_alignment(&job, &AmpliconOpt::default()).unwrap();

    let records = sam_records(&job);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(&rec[1..6], ["16", "chr1", "5018", "60", "18S22M20S"]);
    assert_eq!(rec[9].as_bytes(), reverse_complement(REFERENCE.as_bytes()));
    assert_eq!(rec[14], "CO:Z:REV");
}

#[test]
fn test_short_amplicon_with_relaxed_thresholds() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &["A1\tchr1\t97\tACGTACGTAA\t3\t3\t+".to_string()]);
    let pairs = vec![Pair {
        seq1: b"ACGTACGT".to_vec(),
        seq2: b"TTACGTAC".to_vec(),
    }];
    let (r1, r2) = write_fastqs(dir.path(), &pairs);
    let job = job(dir.path(), list, r1, r2);

    let opt = AmpliconOpt {
        min_insert_size: 2,
        merge_min_score: 5,
        ..AmpliconOpt::default()
    };
    let stats = run_alignment(&job, &opt).unwrap();
    assert_eq!(
        stats.amplicon("A1"),
        AmpliconStat { usable: 1, merged: 1, mapped: 1 }
    );

    let records = sam_records(&job);
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][1..6], ["0", "chr1", "100", "10", "3S4M3S"]);
    assert_eq!(records[0][12], "NM:i:0");
    assert_eq!(records[0][9], "ACGTACGTAA");

    // Default insert length filter rejects the same pair
    let stats = run_alignment(&job, &AmpliconOpt::default()).unwrap();
    assert_eq!(stats.primer_matched, 1);
    assert_eq!(stats.usable, 0);
    assert!(sam_records(&job).is_empty());
}

#[test]
fn test_output_order_across_batches() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &[format!("A1\tchr1\t1000\t{}\t20\t20\t+", REFERENCE)]);
    let pairs: Vec<Pair> = (0..7).map(|_| pair_from(REFERENCE)).collect();
    let (r1, r2) = write_fastqs(dir.path(), &pairs);
    let job = job(dir.path(), list, r1, r2);

    let opt = AmpliconOpt {
        batch_size: 2,
        ..AmpliconOpt::default()
    };
    let stats = run_alignment(&job, &opt).unwrap();
    assert_eq!(stats.mapped, 7);

    let names: Vec<String> = sam_records(&job).into_iter().map(|r| r[0].clone()).collect();
    let expected: Vec<String> = (0..7).map(read_name).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_gzipped_inputs() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &[format!("A1\tchr1\t1000\t{}\t20\t20\t+", REFERENCE)]);
    let pairs = vec![pair_from(REFERENCE), pair_from(REFERENCE)];

    let write_gz = |name: &str, mate: u8| {
        let path = dir.path().join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        write_mate(&mut encoder, &pairs, mate);
        encoder.finish().unwrap();
        path
    };
    let r1 = write_gz("S1_R1.fastq.gz", 1);
    let r2 = write_gz("S1_R2.fastq.gz", 2);
    let job = job(dir.path(), list, r1, r2);

    let stats = run_alignment(&job, &AmpliconOpt::default()).unwrap();
    assert_eq!(stats.mapped, 2);
    assert_eq!(sam_records(&job).len(), 2);
}

#[test]
fn test_unsynchronised_headers_abort() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &[format!("A1\tchr1\t1000\t{}\t20\t20\t+", REFERENCE)]);
    let (r1, _) = write_fastqs(dir.path(), &[pair_from(REFERENCE), pair_from(REFERENCE)]);

    let r2 = dir.path().join("other_R2.fastq");
    let pair = pair_from(REFERENCE);
    let mut file = File::create(&r2).unwrap();
    for i in [0, 5] {
        writeln!(file, "@{} 2:N:0:ACAGTG", read_name(i)).unwrap();
        file.write_all(&pair.seq2).unwrap();
        writeln!(file, "\n+").unwrap();
        file.write_all(&vec![b'I'; pair.seq2.len()]).unwrap();
        writeln!(file).unwrap();
    }
    drop(file);

    let job = job(dir.path(), list, r1, r2);
    let err = run_alignment(&job, &AmpliconOpt::default()).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("not synchronised"), "{}", msg);
    assert!(msg.contains("read pair 2"), "{}", msg);
}

#[test]
fn test_empty_inputs_still_write_outputs() {
    let dir = TempDir::new().unwrap();
    let list = write_list(dir.path(), &[format!("A1\tchr1\t1000\t{}\t20\t20\t+", REFERENCE)]);
    let (r1, r2) = write_fastqs(dir.path(), &[]);
    let job = job(dir.path(), list, r1, r2);

    let stats = run_alignment(&job, &AmpliconOpt::default()).unwrap();
    assert_eq!(stats.total_pairs, 0);

    let sam = fs::read_to_string(job.sam_path()).unwrap();
    assert!(sam.contains("@RG\tID:S1\tSM:S1"));
    assert!(sam_records(&job).is_empty());

    let report = fs::read_to_string(job.stats_path()).unwrap();
    assert!(report.contains("#TotalReads:0\n"));
    assert!(report.contains("#TotalAlignedPairs:0 0.00%\n"));
    assert!(report.ends_with("A1\t0\t0\t0\n"));
}

#[test]
fn test_missing_amplicon_list() {
    let dir = TempDir::new().unwrap();
    let (r1, r2) = write_fastqs(dir.path(), &[pair_from(REFERENCE)]);
    let job = job(dir.path(), dir.path().join("missing.txt"), r1, r2);

    let err = run_alignment(&job, &AmpliconOpt::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("Unable to open amplicon file"));
    assert!(!job.sam_path().exists());
}
