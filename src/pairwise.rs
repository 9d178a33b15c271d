// Pairwise alignment primitive
//
// The reconciliation core only needs two things from an aligner:
// - a local alignment score and end coordinate (adapter clipping)
// - a global alignment rendered as two gapped rows (CIGAR/NM annotation)
//
// `BioAligner` provides both on top of bio::alignment::pairwise.

use bio::alignment::pairwise::{Aligner, MatchParams};
use bio::alignment::{Alignment, AlignmentOperation};

/// Gap character used in rendered alignment rows.
pub const GAP: u8 = b'-';

/// Linear/affine scoring scheme.
///
/// A gap of length k scores `gap_open + (k - 1) * gap_extend`, so
/// `gap_open == gap_extend` describes a linear gap model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoring {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Scoring {
    pub const fn new(match_score: i32, mismatch_score: i32, gap_open: i32, gap_extend: i32) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_open,
            gap_extend,
        }
    }

    // bio charges `open + k * extend` for a gap of length k
    fn bio_aligner(&self) -> Aligner<MatchParams> {
        Aligner::new(
            self.gap_open - self.gap_extend,
            self.gap_extend,
            MatchParams::new(self.match_score, self.mismatch_score),
        )
    }
}

/// Best local hit of a pattern within a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHit {
    pub score: i32,
    /// Exclusive end of the hit in sequence coordinates.
    pub end: usize,
}

/// Global alignment rendered as equal-length rows containing [`GAP`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAlignment {
    pub reference_row: Vec<u8>,
    pub query_row: Vec<u8>,
    pub score: i32,
}

/// Alignment capability consumed by the reconciliation core.
///
/// Methods take `&mut self` so implementations can keep DP buffers between
/// calls; one instance is used per worker.
pub trait PairwiseAligner {
    /// Smith-Waterman alignment of `pattern` against `sequence`.
    fn local(&mut self, sequence: &[u8], pattern: &[u8]) -> LocalHit;

    /// Needleman-Wunsch alignment of `query` against `reference`.
    fn global(&mut self, reference: &[u8], query: &[u8]) -> GlobalAlignment;
}

/// [`PairwiseAligner`] backed by `bio`'s affine-gap aligner.
pub struct BioAligner {
    local: Aligner<MatchParams>,
    global: Aligner<MatchParams>,
}

impl BioAligner {
    pub fn new(local: &Scoring, global: &Scoring) -> Self {
        Self {
            local: local.bio_aligner(),
            global: global.bio_aligner(),
        }
    }
}

impl PairwiseAligner for BioAligner {
    fn local(&mut self, sequence: &[u8], pattern: &[u8]) -> LocalHit {
        if sequence.is_empty() || pattern.is_empty() {
            return LocalHit { score: 0, end: 0 };
        }
        let aln = self.local.local(sequence, pattern);
        LocalHit {
            score: aln.score,
            end: aln.xend,
        }
    }

    fn global(&mut self, reference: &[u8], query: &[u8]) -> GlobalAlignment {
        // x = query, y = reference: Ins is a query-only base, Del a reference-only base
        let aln = self.global.global(query, reference);
        let (query_row, reference_row) = render_rows(&aln, query, reference);
        GlobalAlignment {
            reference_row,
            query_row,
            score: aln.score,
        }
    }
}

/// Expand an alignment path into two gapped rows (x row, y row).
fn render_rows(aln: &Alignment, x: &[u8], y: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let capacity = x.len() + y.len();
    let mut x_row = Vec::with_capacity(capacity);
    let mut y_row = Vec::with_capacity(capacity);
    let mut xi = aln.xstart;
    let mut yi = aln.ystart;

    for op in &aln.operations {
        match *op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                x_row.push(x[xi]);
                y_row.push(y[yi]);
                xi += 1;
                yi += 1;
            }
            AlignmentOperation::Ins => {
                x_row.push(x[xi]);
                y_row.push(GAP);
                xi += 1;
            }
            AlignmentOperation::Del => {
                x_row.push(GAP);
                y_row.push(y[yi]);
                yi += 1;
            }
            AlignmentOperation::Xclip(len) => {
                // Only produced by clipping modes; keep the bases as unpaired columns
                let end = (xi + len).min(x.len());
                for &b in &x[xi..end] {
                    x_row.push(b);
                    y_row.push(GAP);
                }
                xi = end;
            }
            AlignmentOperation::Yclip(len) => {
                let end = (yi + len).min(y.len());
                for &b in &y[yi..end] {
                    x_row.push(GAP);
                    y_row.push(b);
                }
                yi = end;
            }
        }
    }

    (x_row, y_row)
}
