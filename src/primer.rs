// Primer matching and adapter clipping
//
// Reads are attributed to an amplicon by a gapless comparison of the read's
// 5' end against the amplicon primers. Once attributed, each mate is clipped
// after the primer expected at its 3' end so adapter read-through does not
// reach the merger.

use crate::defaults::{PRIMER_ANCHOR_LEN, PRIMER_MIN_IDENTITY};
use crate::pairwise::PairwiseAligner;

/// Returns true if `read` plausibly begins with `primer`.
///
/// The final [`PRIMER_ANCHOR_LEN`] primer bases must match exactly; over the
/// whole primer, matched bases divided by `primer.len() - PRIMER_ANCHOR_LEN`
/// must exceed [`PRIMER_MIN_IDENTITY`]. Read positions past the end of the
/// read count as mismatches.
///
/// Primers no longer than the anchor window have no identity denominator and
/// must match in full.
pub fn match_primer(read: &[u8], primer: &[u8]) -> bool {
    let primer_len = primer.len();
    if primer_len <= PRIMER_ANCHOR_LEN {
        return read.starts_with(primer);
    }

    let anchor_start = primer_len - PRIMER_ANCHOR_LEN;
    let mut matched = 0usize;

    for (pos, &base) in primer.iter().enumerate() {
        if read.get(pos) == Some(&base) {
            matched += 1;
        } else if pos >= anchor_start {
            return false;
        }
    }

    matched as f64 / anchor_start as f64 > PRIMER_MIN_IDENTITY
}

/// Truncate a read after the best local hit of `primer`.
///
/// `primer` must already be oriented as it would appear in the read. When the
/// local alignment score reaches `min_score`, sequence and quality are cut to
/// the hit's end coordinate (the primer bases themselves are kept). Returns
/// whether the read was shortened.
pub fn clip_right_primer<A: PairwiseAligner + ?Sized>(
    seq: &mut Vec<u8>,
    qual: &mut Vec<u8>,
    primer: &[u8],
    aligner: &mut A,
    min_score: i32,
) -> bool {
    let hit = aligner.local(seq, primer);
    if hit.score < min_score || hit.end >= seq.len() {
        return false;
    }

    seq.truncate(hit.end);
    qual.truncate(hit.end);
    true
}
