//! Mapping statistics.
//!
//! Counters are plain sums, so each worker batch can keep its own
//! [`MappingStats`] and fold it into the run total with [`MappingStats::merge`].

use std::collections::HashMap;
use std::io::{self, Write};

use crate::amplicon::AmpliconTemplate;
use crate::reconcile::{DiscardReason, PairOutcome};
use crate::sam_output::RunInfo;

/// Per-amplicon pair counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmpliconStat {
    /// Passed the insert length filter
    pub usable: u64,
    pub merged: u64,
    /// Aligned and written
    pub mapped: u64,
}

impl AmpliconStat {
    fn add(&mut self, other: &AmpliconStat) {
        self.usable += other.usable;
        self.merged += other.merged;
        self.mapped += other.mapped;
    }
}

/// Discards broken down by the gate that stopped the pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardCounts {
    pub n_masked: u64,
    pub no_primer_match: u64,
    pub right_primer_mismatch: u64,
    pub primer_dimer: u64,
    pub not_merged: u64,
    pub low_alignment_score: u64,
    pub annotation_rejected: u64,
    pub excess_mismatches: u64,
}

impl DiscardCounts {
    fn count(&mut self, reason: &DiscardReason<'_>) {
        let slot = match reason {
            DiscardReason::NMasked => &mut self.n_masked,
            DiscardReason::NoPrimerMatch => &mut self.no_primer_match,
            DiscardReason::RightPrimerMismatch(_) => &mut self.right_primer_mismatch,
            DiscardReason::PrimerDimer(_) => &mut self.primer_dimer,
            DiscardReason::NotMerged(_) => &mut self.not_merged,
            DiscardReason::LowAlignmentScore(_) => &mut self.low_alignment_score,
            DiscardReason::AnnotationRejected(_) => &mut self.annotation_rejected,
            DiscardReason::ExcessMismatches(_) => &mut self.excess_mismatches,
        };
        *slot += 1;
    }

    fn add(&mut self, other: &DiscardCounts) {
        self.n_masked += other.n_masked;
        self.no_primer_match += other.no_primer_match;
        self.right_primer_mismatch += other.right_primer_mismatch;
        self.primer_dimer += other.primer_dimer;
        self.not_merged += other.not_merged;
        self.low_alignment_score += other.low_alignment_score;
        self.annotation_rejected += other.annotation_rejected;
        self.excess_mismatches += other.excess_mismatches;
    }

    /// (label, count) per discard reason, in gate order
    pub fn breakdown(&self) -> [(&'static str, u64); 8] {
        [
            ("N-masked", self.n_masked),
            ("no left primer match", self.no_primer_match),
            ("right primer mismatch", self.right_primer_mismatch),
            ("primer dimer", self.primer_dimer),
            ("not merged", self.not_merged),
            ("negative alignment score", self.low_alignment_score),
            ("CIGAR rejected", self.annotation_rejected),
            ("excess mismatches", self.excess_mismatches),
        ]
    }

    pub fn total(&self) -> u64 {
        self.n_masked
            + self.no_primer_match
            + self.right_primer_mismatch
            + self.primer_dimer
            + self.not_merged
            + self.low_alignment_score
            + self.annotation_rejected
            + self.excess_mismatches
    }
}

/// Run-level and per-amplicon counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub total_pairs: u64,
    /// Both primers matched
    pub primer_matched: u64,
    pub usable: u64,
    pub merged: u64,
    pub mapped: u64,
    pub discards: DiscardCounts,
    pub per_amplicon: HashMap<String, AmpliconStat>,
}

impl MappingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one pair's outcome. Every stage the pair passed is counted.
    pub fn record(&mut self, outcome: &PairOutcome<'_>) {
        self.total_pairs += 1;

        // (amplicon, usable, merged, mapped)
        let (amplicon, usable, merged, mapped) = match outcome {
            PairOutcome::Emitted(rec) => (rec.amplicon, true, true, true),
            PairOutcome::Discarded(reason) => {
                self.discards.count(reason);
                match *reason {
                    DiscardReason::NMasked
                    | DiscardReason::NoPrimerMatch
                    | DiscardReason::RightPrimerMismatch(_) => return,
                    DiscardReason::PrimerDimer(a) => (a, false, false, false),
                    DiscardReason::NotMerged(a) => (a, true, false, false),
                    DiscardReason::LowAlignmentScore(a)
                    | DiscardReason::AnnotationRejected(a)
                    | DiscardReason::ExcessMismatches(a) => (a, true, true, false),
                }
            }
        };

        self.primer_matched += 1;
        if !usable {
            return;
        }

        let stat = self.per_amplicon.entry(amplicon.id.clone()).or_default();
        stat.usable += 1;
        self.usable += 1;
        if merged {
            stat.merged += 1;
            self.merged += 1;
        }
        if mapped {
            stat.mapped += 1;
            self.mapped += 1;
        }
    }

    /// Fold another accumulator into this one
    pub fn merge(&mut self, other: &MappingStats) {
        self.total_pairs += other.total_pairs;
        self.primer_matched += other.primer_matched;
        self.usable += other.usable;
        self.merged += other.merged;
        self.mapped += other.mapped;
        self.discards.add(&other.discards);
        for (id, stat) in &other.per_amplicon {
            self.per_amplicon.entry(id.clone()).or_default().add(stat);
        }
    }

    pub fn n_masked(&self) -> u64 {
        self.discards.n_masked
    }

    pub fn unmerged(&self) -> u64 {
        self.discards.not_merged
    }

    pub fn amplicon(&self, id: &str) -> AmpliconStat {
        self.per_amplicon.get(id).copied().unwrap_or_default()
    }

    /// Percentage of usable pairs; 0 when there are none
    pub fn percent_of_usable(&self, count: u64) -> f64 {
        if self.usable == 0 {
            0.0
        } else {
            count as f64 / self.usable as f64 * 100.0
        }
    }

    /// Write the `<PREFIX>_MappingStats.txt` report.
    ///
    /// The per-amplicon table follows `amplicons` order and lists amplicons
    /// that received no pairs with zero counts.
    pub fn write_report<W: Write>(
        &self,
        out: &mut W,
        run: &RunInfo,
        amplicons: &[AmpliconTemplate],
    ) -> io::Result<()> {
        writeln!(out, "#ID:{}", run.read_group_id)?;
        writeln!(out, "#CL:{}", run.command_line)?;
        writeln!(out, "#PG:{} v{}", run.program, run.version)?;
        writeln!(out, "#TotalReads:{}", self.total_pairs)?;
        writeln!(out, "#NMaskedPairs:{}", self.n_masked())?;
        writeln!(out, "#PrimerMatchedPairs:{}", self.primer_matched)?;
        writeln!(out, "#UsablePairs:{}", self.usable)?;
        writeln!(
            out,
            "#UnmergedPairs:{} {:.2}%",
            self.unmerged(),
            self.percent_of_usable(self.unmerged())
        )?;
        writeln!(
            out,
            "#TotalAlignedPairs:{} {:.2}%",
            self.mapped,
            self.percent_of_usable(self.mapped)
        )?;

        writeln!(out, "#Amplicon\tUsableReads\tMergedReads\tMappedReads")?;
        for amplicon in amplicons {
            let stat = self.amplicon(&amplicon.id);
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                amplicon.id, stat.usable, stat.merged, stat.mapped
            )?;
        }
        Ok(())
    }
}
