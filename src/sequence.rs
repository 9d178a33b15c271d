//! Nucleotide helpers shared by every stage of the pipeline.

/// Complement of a single base, preserving case. Anything outside
/// `ACGTacgt` passes through unchanged.
#[inline(always)]
pub const fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'a' => b't',
        b't' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        other => other,
    }
}

/// Reverse complement of a DNA sequence.
///
/// Total over arbitrary bytes: IUPAC codes, `N` and gap characters are kept
/// at their mirrored position.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Reverse a quality string so it follows a reverse-complemented sequence.
pub fn reverse_quality(qual: &[u8]) -> Vec<u8> {
    qual.iter().rev().copied().collect()
}

/// True when the sequence is composed only of upper-case `A`, `C`, `G`, `T`.
pub fn is_unambiguous_dna(seq: &[u8]) -> bool {
    seq.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

/// True when every base is an `N` (the sequencer could not call any base).
///
/// An empty read is treated as masked, it carries nothing to align.
pub fn is_n_masked(seq: &[u8]) -> bool {
    seq.iter().all(|b| matches!(b, b'N' | b'n'))
}
