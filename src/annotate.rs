// Alignment annotation: CIGAR and edit distance
//
// A global alignment of the merged contig against the amplicon reference is
// reduced to run-length spans, then the primer bases at both ends are turned
// into soft clips:
//
//   reference  ACGTACGTAA
//   contig     ACGTACGTAA      ->  3S4M3S  (left primer 3, right primer 3)
//
// Mismatches inside the primer columns never count toward NM.

use crate::cigar::{Cigar, CigarOp, push_run};
use crate::pairwise::GAP;

/// CIGAR, NM and qualifying mismatch count of one contig alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentAnnotation {
    /// Always starts and ends with a soft clip over the primers
    pub cigar: Cigar,
    /// Indel bases plus qualifying mismatches
    pub edit_distance: u32,
    /// Single-base mismatches outside the primer columns
    pub mismatches: u32,
}

#[inline]
fn classify(reference: u8, query: u8) -> CigarOp {
    if query == GAP {
        CigarOp::D
    } else if reference == GAP {
        CigarOp::I
    } else {
        CigarOp::M
    }
}

/// Annotate a global alignment given as two equal-length gapped rows.
///
/// `left_primer`/`right_primer` are the primer lengths in reference-forward
/// orientation. A mismatch column counts only when its 1-based index `j`
/// satisfies `left_primer < j <= columns - right_primer`.
///
/// Returns `None` when the alignment cannot be soft-clipped:
/// * a single span that is not M or does not exceed both primers combined
/// * exactly two spans
/// * an outer span that is not M or is shorter than its primer
pub fn annotate_alignment(
    reference_row: &[u8],
    query_row: &[u8],
    left_primer: usize,
    right_primer: usize,
) -> Option<AlignmentAnnotation> {
    debug_assert_eq!(reference_row.len(), query_row.len());

    let columns = query_row.len();
    let mut mismatches = 0u32;

    let spans = reference_row.iter().zip(query_row).enumerate().fold(
        Cigar::new(),
        |mut spans, (i, (&r, &q))| {
            let op = classify(r, q);
            let column = i + 1;
            if op == CigarOp::M
                && r != q
                && column > left_primer
                && column + right_primer <= columns
            {
                mismatches += 1;
            }
            push_run(&mut spans, op, 1);
            spans
        },
    );

    let left = left_primer as u32;
    let right = right_primer as u32;
    let mut cigar = Cigar::with_capacity(spans.len() + 2);
    let mut edit_distance = mismatches;

    match spans.as_slice() {
        [(CigarOp::M, len)] if *len > left + right => {
            cigar.push((CigarOp::S, left));
            cigar.push((CigarOp::M, len - left - right));
            cigar.push((CigarOp::S, right));
        }
        [(CigarOp::M, first), interior @ .., (CigarOp::M, last)]
            if !interior.is_empty() && *first >= left && *last >= right =>
        {
            cigar.push((CigarOp::S, left));
            push_run(&mut cigar, CigarOp::M, first - left);
            for &(op, len) in interior {
                if op != CigarOp::M {
                    edit_distance += len;
                }
                cigar.push((op, len));
            }
            push_run(&mut cigar, CigarOp::M, last - right);
            cigar.push((CigarOp::S, right));
        }
        _ => return None,
    }

    Some(AlignmentAnnotation {
        cigar,
        edit_distance,
        mismatches,
    })
}
