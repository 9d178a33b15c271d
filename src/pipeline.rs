// Alignment run driver
//
// - Reader thread fills a bounded channel with batches of read pairs
// - Each batch is reconciled in parallel (one aligner per rayon worker)
// - Records are written in input order, then the batch's counters are folded
//   into the run total
// - The SAM header is written once the first pair's flowcell is known

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use crate::amplicon::{AmpliconTemplate, load_amplicons};
use crate::amplicon_opt::AmpliconOpt;
use crate::fastq_reader::{PairedFastqReader, ReadPair, flowcell_id};
use crate::pairwise::BioAligner;
use crate::reconcile::{PairOutcome, reconcile_pair};
use crate::sam_output::{RunInfo, write_header, write_record};
use crate::stats::MappingStats;

// Err aborts the run; a closed channel means EOF
type PairBatchMessage = Result<Vec<ReadPair>>;

/// Inputs and outputs of one alignment run.
#[derive(Debug, Clone)]
pub struct AlignJob {
    pub amplicons: PathBuf,
    pub read1: PathBuf,
    pub read2: PathBuf,
    pub prefix: String,
    /// Recorded in @PG and the stats report
    pub command_line: String,
}

impl AlignJob {
    pub fn sam_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.sam", self.prefix))
    }

    pub fn stats_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_MappingStats.txt", self.prefix))
    }

    /// Sample name: the prefix without any leading directories
    pub fn sample_name(&self) -> String {
        Path::new(&self.prefix)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.prefix.clone())
    }
}

fn reader_thread(mut reader: PairedFastqReader, batch_size: usize, sender: Sender<PairBatchMessage>) {
    let mut batch_count = 0usize;

    loop {
        let batch = match reader.read_batch(batch_size) {
            Ok(b) => b,
            Err(e) => {
                let _ = sender.send(Err(e));
                break;
            }
        };

        if batch.is_empty() {
            log::debug!("[Reader thread] EOF reached, shutting down");
            break;
        }

        let partial = batch.len() < batch_size;
        if sender.send(Ok(batch)).is_err() {
            log::debug!(
                "[Reader thread] Batch {}: Channel closed, shutting down",
                batch_count
            );
            break;
        }
        batch_count += 1;

        // A partial batch is the last one
        if partial {
            break;
        }
    }

    log::debug!(
        "[Reader thread] Exiting - sent {} batches, {} total pairs, sample index {}",
        batch_count,
        reader.pairs_read(),
        reader.sample_index().unwrap_or("-")
    );
}

/// Reconcile a batch in parallel; outcomes keep input order.
pub fn reconcile_batch<'a>(
    batch: &'a [ReadPair],
    amplicons: &'a [AmpliconTemplate],
    opt: &AmpliconOpt,
) -> Vec<PairOutcome<'a>> {
    batch
        .par_iter()
        .map_init(
            || BioAligner::new(&opt.local_scoring, &opt.global_scoring),
            |aligner, pair| reconcile_pair(pair, amplicons, opt, aligner),
        )
        .collect()
}

/// Run a full alignment: amplicon list + paired FASTQ in, SAM + stats out.
pub fn run_alignment(job: &AlignJob, opt: &AmpliconOpt) -> Result<MappingStats> {
    let start_time = Instant::now();

    let amplicons = load_amplicons(&job.amplicons)?;
    if amplicons.is_empty() {
        log::warn!("Amplicon list {} has no amplicons", job.amplicons.display());
    }

    let reader = PairedFastqReader::new(&job.read1, &job.read2)?;
    log::info!(
        "Reading pairs from {} and {}",
        job.read1.display(),
        job.read2.display()
    );

    let sam_path = job.sam_path();
    let mut sam_out = BufWriter::new(
        File::create(&sam_path)
            .with_context(|| format!("Could not create SAM file {}", sam_path.display()))?,
    );
    let stats_path = job.stats_path();
    let mut stats_out = BufWriter::new(
        File::create(&stats_path)
            .with_context(|| format!("Could not create stats file {}", stats_path.display()))?,
    );

    // Buffer size of 2 allows reader to stay 1 batch ahead
    let (sender, receiver): (Sender<PairBatchMessage>, Receiver<PairBatchMessage>) = bounded(2);
    let batch_size = opt.batch_size.max(1);
    let reader_handle = thread::spawn(move || reader_thread(reader, batch_size, sender));

    let sample = job.sample_name();
    let mut run_info: Option<RunInfo> = None;
    let mut stats = MappingStats::new();
    let mut batch_num = 0usize;

    for message in receiver.iter() {
        let batch = message?;
        batch_num += 1;

        if run_info.is_none() {
            let flowcell = batch.first().and_then(|pair| flowcell_id(&pair.name));
            if flowcell.is_none() {
                log::warn!("No flowcell ID in read names; read group is {}", sample);
            }
            let run = RunInfo::new(&sample, flowcell.as_deref(), &job.command_line);
            write_header(&mut sam_out, &amplicons.sam_headers, &run)
                .with_context(|| format!("Could not write headers to {}", sam_path.display()))?;
            run_info = Some(run);
        }
        let read_group_id = run_info
            .as_ref()
            .map_or(sample.as_str(), |run| run.read_group_id.as_str());

        let outcomes = reconcile_batch(&batch, &amplicons.templates, opt);

        let mut batch_stats = MappingStats::new();
        for outcome in &outcomes {
            batch_stats.record(outcome);
            if let PairOutcome::Emitted(rec) = outcome {
                write_record(&mut sam_out, rec, read_group_id)
                    .with_context(|| format!("Could not write alignments to {}", sam_path.display()))?;
            }
        }

        log::debug!(
            "Batch {}: {} pairs, {} aligned",
            batch_num,
            batch.len(),
            batch_stats.mapped
        );
        stats.merge(&batch_stats);
    }

    reader_handle
        .join()
        .map_err(|_| anyhow!("FASTQ reader thread panicked"))?;

    // Empty input still gets a header
    let run = match run_info {
        Some(run) => run,
        None => {
            log::warn!("No read pairs in input");
            let run = RunInfo::new(&sample, None, &job.command_line);
            write_header(&mut sam_out, &amplicons.sam_headers, &run)
                .with_context(|| format!("Could not write headers to {}", sam_path.display()))?;
            run
        }
    };

    sam_out
        .flush()
        .with_context(|| format!("Could not write alignments to {}", sam_path.display()))?;
    stats
        .write_report(&mut stats_out, &run, &amplicons.templates)
        .and_then(|_| stats_out.flush())
        .with_context(|| format!("Could not write stats to {}", stats_path.display()))?;

    log_summary(&stats);
    log::info!(
        "Wrote {} and {} in {:.2} sec",
        sam_path.display(),
        stats_path.display(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(stats)
}

fn log_summary(stats: &MappingStats) {
    log::info!("Total read pairs: {}", stats.total_pairs);
    log::info!("  N-masked: {}", stats.n_masked());
    log::info!("  Primer matched: {}", stats.primer_matched);
    log::info!("  Usable: {}", stats.usable);
    log::info!(
        "  Unmerged: {} ({:.2}% of usable)",
        stats.unmerged(),
        stats.percent_of_usable(stats.unmerged())
    );
    log::info!(
        "  Aligned: {} ({:.2}% of usable)",
        stats.mapped,
        stats.percent_of_usable(stats.mapped)
    );

    log::info!("  Discarded: {}", stats.discards.total());
    for (label, count) in stats.discards.breakdown() {
        if count > 0 {
            log::debug!("    {}: {}", label, count);
        }
    }
}
