// src/defaults.rs

// Read admission
pub const MIN_INSERT_SIZE: usize = 5; // bases required beyond both primers
pub const MAX_QSCORE: u8 = 40;
pub const PHRED_OFFSET: u8 = 33;
pub const MAX_MISMATCH_FRACTION: f64 = 0.05; // qualifying mismatches / reference length
pub const MAX_MAPQ: u8 = 60;

// Primer matching
pub const PRIMER_ANCHOR_LEN: usize = 3; // 3' bases that must match exactly
pub const PRIMER_MIN_IDENTITY: f64 = 0.8;

// Adapter clipping (local alignment)
pub const CLIP_MIN_SCORE: i32 = 10;
pub const CLIP_MATCH_SCORE: i32 = 1;
pub const CLIP_MISMATCH_SCORE: i32 = -2;
pub const CLIP_GAP_OPEN: i32 = -4;
pub const CLIP_GAP_EXTEND: i32 = -4;

// Mate merging
pub const MERGE_MIN_SCORE: i32 = 15;
pub const MERGE_MATCH_AWARD: i32 = 1;
pub const MERGE_MISMATCH_PENALTY: i32 = 4;
pub const MERGE_MISMATCH_DENOMINATOR: usize = 20; // at most 5% of the overlap may mismatch
pub const MERGE_MAX_AMBIGUITY_RATIO: f64 = 0.9;

// Contig to amplicon global alignment
pub const GLOBAL_MATCH_SCORE: i32 = 1;
pub const GLOBAL_MISMATCH_SCORE: i32 = -3;
pub const GLOBAL_GAP_OPEN: i32 = -8;
pub const GLOBAL_GAP_EXTEND: i32 = -1;

// Processing
pub const BATCH_SIZE: usize = 4096;
pub const HEADER_CHECK_PAIRS: usize = 15;
pub const VERBOSITY: i32 = 3;
