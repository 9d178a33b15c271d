// src/amplicon_opt.rs
//
// Runtime options for pair reconciliation, with stage bundles handed to the
// merger and the aligner.

use clap::Args;
use std::path::PathBuf;

use crate::defaults::*;
use crate::pairwise::Scoring;

/// Reconciliation options. `Default` mirrors the constants in `defaults`.
#[derive(Debug, Clone)]
pub struct AmpliconOpt {
    // Read admission
    pub min_insert_size: usize,     // Bases required beyond both primers after clipping
    pub max_mismatch_fraction: f64, // Qualifying mismatches / reference length
    pub max_mapq: u8,               // MAPQ = min(alignment score, max_mapq)

    // Quality encoding
    pub max_qscore: u8,
    pub phred_offset: u8,

    // Adapter clipping
    pub clip_min_score: i32,
    pub local_scoring: Scoring,

    // Mate merging
    pub merge_min_score: i32,
    pub merge_match_award: i32,
    pub merge_mismatch_penalty: i32,
    pub merge_mismatch_denominator: usize,
    pub merge_max_ambiguity_ratio: f64,

    // Contig to amplicon alignment
    pub global_scoring: Scoring,

    // Processing
    pub n_threads: usize,
    pub batch_size: usize, // Read pairs per batch
    pub verbosity: i32,    // 1=error, 2=warning, 3=message, 4=debug, 5+=trace
}

/// Parameters for the merge stage
#[derive(Debug, Clone)]
pub struct MergeParams {
    pub min_score: i32,
    pub match_award: i32,
    pub mismatch_penalty: i32,
    pub mismatch_denominator: usize,
    pub max_ambiguity_ratio: f64,
    pub max_qscore: u8,
    pub phred_offset: u8,
}

impl Default for MergeParams {
    fn default() -> Self {
        AmpliconOpt::default().merge_params()
    }
}

#[derive(Debug, Clone, Args)]
pub struct AlignCliOptions {
    /// Tab-separated amplicon list
    #[arg(value_name = "AMPLICONS")]
    pub amplicons: PathBuf,

    /// Mate 1 FASTQ (optionally gzipped)
    #[arg(value_name = "READ1.FQ")]
    pub read1: PathBuf,

    /// Mate 2 FASTQ (optionally gzipped)
    #[arg(value_name = "READ2.FQ")]
    pub read2: PathBuf,

    /// Output prefix: writes PREFIX.sam and PREFIX_MappingStats.txt; also the sample name
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    // ===== Reconciliation Options =====
    /// Bases required beyond both primers for a pair to be usable
    #[arg(long = "min-insert", value_name = "INT", default_value_t = MIN_INSERT_SIZE)]
    pub min_insert: usize,

    /// Discard alignments whose mismatches exceed FLOAT * reference length
    #[arg(long, value_name = "FLOAT", default_value_t = MAX_MISMATCH_FRACTION)]
    pub max_mismatch_fraction: f64,

    /// Minimum overlap score for merging mates (exclusive)
    #[arg(long, value_name = "INT", default_value_t = MERGE_MIN_SCORE)]
    pub min_merge_score: i32,

    /// Minimum local alignment score for clipping after a primer
    #[arg(long, value_name = "INT", default_value_t = CLIP_MIN_SCORE)]
    pub clip_min_score: i32,

    // ===== Processing Options =====
    /// Number of threads (default: all available cores)
    #[arg(short = 't', long, value_name = "INT")]
    pub threads: Option<usize>,

    /// Read pairs per batch
    #[arg(short = 'K', long, value_name = "INT", default_value_t = BATCH_SIZE)]
    pub batch_size: usize,

    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = VERBOSITY)]
    pub verbosity: i32,
}

impl Default for AmpliconOpt {
    /// Default values match the constants in `defaults`
    fn default() -> Self {
        AmpliconOpt {
            min_insert_size: MIN_INSERT_SIZE,
            max_mismatch_fraction: MAX_MISMATCH_FRACTION,
            max_mapq: MAX_MAPQ,
            max_qscore: MAX_QSCORE,
            phred_offset: PHRED_OFFSET,
            clip_min_score: CLIP_MIN_SCORE,
            local_scoring: Scoring::new(
                CLIP_MATCH_SCORE,
                CLIP_MISMATCH_SCORE,
                CLIP_GAP_OPEN,
                CLIP_GAP_EXTEND,
            ),
            merge_min_score: MERGE_MIN_SCORE,
            merge_match_award: MERGE_MATCH_AWARD,
            merge_mismatch_penalty: MERGE_MISMATCH_PENALTY,
            merge_mismatch_denominator: MERGE_MISMATCH_DENOMINATOR,
            merge_max_ambiguity_ratio: MERGE_MAX_AMBIGUITY_RATIO,
            global_scoring: Scoring::new(
                GLOBAL_MATCH_SCORE,
                GLOBAL_MISMATCH_SCORE,
                GLOBAL_GAP_OPEN,
                GLOBAL_GAP_EXTEND,
            ),
            n_threads: 1,
            batch_size: BATCH_SIZE,
            verbosity: VERBOSITY,
        }
    }
}

impl AmpliconOpt {
    /// Apply command-line overrides on top of the defaults.
    /// Thread count is resolved separately in `main`.
    pub fn from_cli(cli: &AlignCliOptions) -> Self {
        AmpliconOpt {
            min_insert_size: cli.min_insert,
            max_mismatch_fraction: cli.max_mismatch_fraction,
            merge_min_score: cli.min_merge_score,
            clip_min_score: cli.clip_min_score,
            batch_size: cli.batch_size,
            verbosity: cli.verbosity,
            ..AmpliconOpt::default()
        }
    }

    /// Get merge-stage parameters as a bundle
    pub fn merge_params(&self) -> MergeParams {
        MergeParams {
            min_score: self.merge_min_score,
            match_award: self.merge_match_award,
            mismatch_penalty: self.merge_mismatch_penalty,
            mismatch_denominator: self.merge_mismatch_denominator,
            max_ambiguity_ratio: self.merge_max_ambiguity_ratio,
            max_qscore: self.max_qscore,
            phred_offset: self.phred_offset,
        }
    }

    /// Validate parameters for consistency across stages
    /// Returns Ok(()) if valid, or Err with description of issues
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.max_mismatch_fraction) {
            errors.push(format!(
                "max_mismatch_fraction must be in [0, 1], got {}",
                self.max_mismatch_fraction
            ));
        }
        if self.max_qscore == 0 {
            errors.push("max_qscore must be >= 1, got 0".to_string());
        }

        // Merging
        if self.merge_min_score < 0 {
            errors.push(format!(
                "merge_min_score must be >= 0, got {}",
                self.merge_min_score
            ));
        }
        if self.merge_match_award < 1 {
            errors.push(format!(
                "merge_match_award must be >= 1, got {}",
                self.merge_match_award
            ));
        }
        if self.merge_mismatch_penalty < 0 {
            errors.push(format!(
                "merge_mismatch_penalty must be >= 0, got {}",
                self.merge_mismatch_penalty
            ));
        }
        if self.merge_mismatch_denominator == 0 {
            errors.push("merge_mismatch_denominator must be >= 1, got 0".to_string());
        }
        if !(self.merge_max_ambiguity_ratio > 0.0 && self.merge_max_ambiguity_ratio <= 1.0) {
            errors.push(format!(
                "merge_max_ambiguity_ratio must be in (0, 1], got {}",
                self.merge_max_ambiguity_ratio
            ));
        }

        // Scoring schemes
        for (stage, scoring) in [("local", &self.local_scoring), ("global", &self.global_scoring)]
        {
            if scoring.match_score < 1 {
                errors.push(format!(
                    "{} match score must be >= 1, got {}",
                    stage, scoring.match_score
                ));
            }
            if scoring.mismatch_score > 0 || scoring.gap_open > 0 || scoring.gap_extend > 0 {
                errors.push(format!(
                    "{} mismatch and gap scores must be <= 0, got {}/{}/{}",
                    stage, scoring.mismatch_score, scoring.gap_open, scoring.gap_extend
                ));
            }
        }

        // Processing
        if self.batch_size < 1 {
            errors.push(format!("batch_size must be >= 1, got {}", self.batch_size));
        }
        if self.n_threads < 1 {
            errors.push(format!("n_threads must be >= 1, got {}", self.n_threads));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
