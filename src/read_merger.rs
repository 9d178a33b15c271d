// Paired-end read merging
//
// Mate 2 is brought into mate 1's frame (reverse complement, reversed
// qualities) and slid along mate 1 one base at a time:
//
//   offset 0    R1 ---------->        offset p   R1 ---------->
//               R2 ---------->                           R2 ---------->
//
// Each offset is scored gaplessly (+award / -penalty). The best offset must
// clearly beat the previous best and mate 2 must reach mate 1's end before a
// quality-aware consensus contig is built.

use crate::amplicon_opt::MergeParams;
use crate::sequence::{reverse_complement, reverse_quality};

/// Consensus of two merged mates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedContig {
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

/// Best gapless placement of mate 2 against mate 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// Position in mate 1 where mate 2's first base lands
    pub offset: usize,
    pub score: i32,
    /// Best score held before `score` displaced it
    pub runner_up: i32,
}

impl Overlap {
    /// Overlap passes the score, ambiguity and span thresholds
    pub fn is_confident(&self, len1: usize, len2: usize, params: &MergeParams) -> bool {
        self.score > params.min_score
            && (self.runner_up as f64 / self.score as f64) < params.max_ambiguity_ratio
            && len2 + self.offset >= len1
    }
}

/// Scan all offsets of `seq2` (already in mate 1's frame) along `seq1`.
///
/// Returns `None` when no offset scores above zero. Scoring of an offset stops
/// early once its mismatches exceed `(seq1.len() - offset) / mismatch_denominator`.
///
/// `runner_up` is the best score seen before the final improvement, not the
/// second highest score over all offsets: an offset that ties or trails the
/// running best is never compared.
pub fn find_overlap(seq1: &[u8], seq2: &[u8], params: &MergeParams) -> Option<Overlap> {
    let mut best: Option<Overlap> = None;
    let mut best_score = 0;

    for offset in 0..seq1.len() {
        let mismatch_budget = (seq1.len() - offset) / params.mismatch_denominator;
        let mut score = 0i32;
        let mut mismatches = 0usize;

        for (a, b) in seq1[offset..].iter().zip(seq2) {
            if a == b {
                score += params.match_award;
            } else {
                score -= params.mismatch_penalty;
                mismatches += 1;
                if mismatches > mismatch_budget {
                    break;
                }
            }
        }

        if score > best_score {
            best = Some(Overlap {
                offset,
                score,
                runner_up: best_score,
            });
            best_score = score;
        }
    }

    best
}

/// Merge two mates into one contig.
///
/// `seq2`/`qual2` are given in mate 2's sequencing orientation. Within the
/// overlap the base with the higher Phred quality wins (ties keep mate 1);
/// agreeing bases get the summed quality capped at `max_qscore`, disagreeing
/// bases the quality difference.
///
/// # Returns
/// * `Some(MergedContig)` of length `offset + seq2.len()`
/// * `None` if no confident overlap exists
pub fn merge_reads(
    seq1: &[u8],
    qual1: &[u8],
    seq2: &[u8],
    qual2: &[u8],
    params: &MergeParams,
) -> Option<MergedContig> {
    let seq2 = reverse_complement(seq2);
    let qual2 = reverse_quality(qual2);

    let overlap = find_overlap(seq1, &seq2, params)?;
    if !overlap.is_confident(seq1.len(), seq2.len(), params) {
        return None;
    }

    let offset = overlap.offset;
    let overlap_len = seq1.len() - offset;
    let phred_offset = params.phred_offset as i32;
    let max_q = params.max_qscore as i32;
    let encode = |q: i32| (q.max(0) + phred_offset) as u8;

    let mut seq = Vec::with_capacity(offset + seq2.len());
    let mut qual = Vec::with_capacity(offset + seq2.len());
    seq.extend_from_slice(&seq1[..offset]);
    qual.extend_from_slice(&qual1[..offset]);

    for i in 0..overlap_len {
        let (b1, b2) = (seq1[offset + i], seq2[i]);
        let q1 = qual1[offset + i] as i32 - phred_offset;
        let q2 = qual2[i] as i32 - phred_offset;

        if b1 == b2 {
            seq.push(b1);
            qual.push(encode((q1 + q2).min(max_q)));
        } else if q1 >= q2 {
            seq.push(b1);
            qual.push(encode(q1 - q2));
        } else {
            seq.push(b2);
            qual.push(encode(q2 - q1));
        }
    }

    seq.extend_from_slice(&seq2[overlap_len..]);
    qual.extend_from_slice(&qual2[overlap_len..]);

    Some(MergedContig { seq, qual })
}
