//! CIGAR operations for contig-to-amplicon alignments.
//!
//! CIGARs are run-length vectors of `(CigarOp, length)`. Only the four
//! operations produced by annotation exist: aligned columns, insertions,
//! deletions and soft clips over primer bases.

use std::fmt::Write;

/// CIGAR operation type with zero-cost conversion to bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CigarOp {
    M = b'M', // Match/mismatch
    I = b'I', // Insertion to reference
    D = b'D', // Deletion from reference
    S = b'S', // Soft clip
}

impl CigarOp {
    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if this operation consumes query bases
    #[inline(always)]
    pub const fn consumes_query(self) -> bool {
        matches!(self, Self::M | Self::I | Self::S)
    }

    /// Returns true if this operation consumes reference bases
    #[inline(always)]
    pub const fn consumes_ref(self) -> bool {
        matches!(self, Self::M | Self::D)
    }
}

pub type Cigar = Vec<(CigarOp, u32)>;

/// Append `len` units of `op`, extending the last run when it is the same op.
#[inline]
pub fn push_run(cigar: &mut Cigar, op: CigarOp, len: u32) {
    if len == 0 {
        return;
    }
    match cigar.last_mut() {
        Some((last, run)) if *last == op => *run += len,
        _ => cigar.push((op, len)),
    }
}

/// Sums M and D (operations that consume reference bases).
#[inline]
pub fn reference_length(cigar: &[(CigarOp, u32)]) -> u32 {
    cigar
        .iter()
        .filter(|(op, _)| op.consumes_ref())
        .map(|&(_, len)| len)
        .sum()
}

/// Sums M, I and S (operations that consume query bases).
#[inline]
pub fn query_length(cigar: &[(CigarOp, u32)]) -> u32 {
    cigar
        .iter()
        .filter(|(op, _)| op.consumes_query())
        .map(|&(_, len)| len)
        .sum()
}

/// Convert CIGAR to string representation (e.g., "20S52M1D31M18S").
pub fn to_string(cigar: &[(CigarOp, u32)]) -> String {
    if cigar.is_empty() {
        return "*".to_string();
    }

    let mut result = String::with_capacity(cigar.len() * 4);
    for &(op, len) in cigar {
        // Writing into a String cannot fail
        let _ = write!(&mut result, "{}{}", len, op.to_byte() as char);
    }
    result
}
