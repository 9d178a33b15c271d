pub mod amplicon; // Amplicon list parsing and templates
pub mod amplicon_opt;
pub mod annotate; // CIGAR and edit distance from a global alignment
pub mod cigar;
pub mod defaults;
pub mod fastq_reader; // Paired FASTQ reader using bio::io::fastq
pub mod pairwise; // Local/global aligners backed by bio::alignment::pairwise
pub mod pipeline; // Batched reader thread + parallel reconciliation
pub mod primer;
pub mod read_merger; // Mate overlap detection and consensus
pub mod reconcile;
pub mod sam_output;
pub mod sequence;
pub mod stats;
