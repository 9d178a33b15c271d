// Per-pair reconciliation
//
// Each read pair walks one gate after another and ends either as an emitted
// record or as a discard with the gate that stopped it:
//
//   N-mask -> left primer (first amplicon wins) -> right primer -> clip
//          -> insert length -> merge -> strand normalisation
//          -> global alignment -> CIGAR/NM -> mismatch rate -> Emitted
//
// Evaluation is pure apart from the aligner's scratch buffers, so pairs can
// be evaluated on any worker and tallied afterwards.

use crate::amplicon::{AmpliconTemplate, Strand};
use crate::amplicon_opt::AmpliconOpt;
use crate::annotate::annotate_alignment;
use crate::cigar::Cigar;
use crate::fastq_reader::ReadPair;
use crate::pairwise::PairwiseAligner;
use crate::primer::{clip_right_primer, match_primer};
use crate::read_merger::merge_reads;
use crate::sequence::{is_n_masked, reverse_complement, reverse_quality};

/// A merged pair aligned to its amplicon, ready for SAM output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRecord<'a> {
    pub name: &'a str,
    pub amplicon: &'a AmpliconTemplate,
    /// Merged contig in reference-forward orientation
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
    pub cigar: Cigar,
    pub edit_distance: u32,
    /// Raw global alignment score
    pub score: i32,
    /// Score capped at the configured maximum
    pub mapq: u8,
}

impl AlignedRecord<'_> {
    pub fn flag(&self) -> u16 {
        self.amplicon.strand.sam_flag()
    }
}

/// Gate at which a pair was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason<'a> {
    /// Either mate has no called bases
    NMasked,
    /// Mate 1 matches no amplicon's left primer
    NoPrimerMatch,
    /// Mate 2 misses the right primer of the first left-primer hit
    RightPrimerMismatch(&'a AmpliconTemplate),
    /// A clipped mate is too short to carry an insert
    PrimerDimer(&'a AmpliconTemplate),
    NotMerged(&'a AmpliconTemplate),
    LowAlignmentScore(&'a AmpliconTemplate),
    AnnotationRejected(&'a AmpliconTemplate),
    ExcessMismatches(&'a AmpliconTemplate),
}

impl<'a> DiscardReason<'a> {
    /// Amplicon the pair was attributed to, if it got that far
    pub fn amplicon(&self) -> Option<&'a AmpliconTemplate> {
        match *self {
            DiscardReason::NMasked | DiscardReason::NoPrimerMatch => None,
            DiscardReason::RightPrimerMismatch(a)
            | DiscardReason::PrimerDimer(a)
            | DiscardReason::NotMerged(a)
            | DiscardReason::LowAlignmentScore(a)
            | DiscardReason::AnnotationRejected(a)
            | DiscardReason::ExcessMismatches(a) => Some(a),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome<'a> {
    Emitted(AlignedRecord<'a>),
    Discarded(DiscardReason<'a>),
}

/// Evaluate one read pair against the amplicon list.
///
/// Amplicons are tried in order; the first whose left primer matches mate 1
/// owns the pair, whatever happens afterwards. The pair itself is never
/// modified: clipping and merging work on copies.
pub fn reconcile_pair<'a, A: PairwiseAligner + ?Sized>(
    pair: &'a ReadPair,
    amplicons: &'a [AmpliconTemplate],
    opt: &AmpliconOpt,
    aligner: &mut A,
) -> PairOutcome<'a> {
    use DiscardReason::*;

    if is_n_masked(&pair.seq1) || is_n_masked(&pair.seq2) {
        return PairOutcome::Discarded(NMasked);
    }

    let Some(amplicon) = amplicons
        .iter()
        .find(|a| match_primer(&pair.seq1, &a.left_primer))
    else {
        return PairOutcome::Discarded(NoPrimerMatch);
    };

    if !match_primer(&pair.seq2, &amplicon.right_primer) {
        return PairOutcome::Discarded(RightPrimerMismatch(amplicon));
    }

    // Each mate reads through into the opposite primer at its 3' end
    let (mut seq1, mut qual1) = (pair.seq1.clone(), pair.qual1.clone());
    let (mut seq2, mut qual2) = (pair.seq2.clone(), pair.qual2.clone());
    clip_right_primer(
        &mut seq1,
        &mut qual1,
        &reverse_complement(&amplicon.right_primer),
        aligner,
        opt.clip_min_score,
    );
    clip_right_primer(
        &mut seq2,
        &mut qual2,
        &reverse_complement(&amplicon.left_primer),
        aligner,
        opt.clip_min_score,
    );

    let min_len = amplicon.left_primer.len() + amplicon.right_primer.len() + opt.min_insert_size;
    if seq1.len() < min_len || seq2.len() < min_len {
        return PairOutcome::Discarded(PrimerDimer(amplicon));
    }

    let Some(contig) = merge_reads(&seq1, &qual1, &seq2, &qual2, &opt.merge_params()) else {
        return PairOutcome::Discarded(NotMerged(amplicon));
    };

    let (seq, qual) = match amplicon.strand {
        Strand::Forward => (contig.seq, contig.qual),
        Strand::Reverse => (reverse_complement(&contig.seq), reverse_quality(&contig.qual)),
    };
    let (left, right) = amplicon.oriented_primer_lengths();

    let aln = aligner.global(&amplicon.reference, &seq);
    if aln.score < 0 {
        return PairOutcome::Discarded(LowAlignmentScore(amplicon));
    }

    let Some(annotation) = annotate_alignment(&aln.reference_row, &aln.query_row, left, right)
    else {
        return PairOutcome::Discarded(AnnotationRejected(amplicon));
    };

    let mismatch_rate = annotation.mismatches as f64 / amplicon.reference.len() as f64;
    if mismatch_rate > opt.max_mismatch_fraction {
        return PairOutcome::Discarded(ExcessMismatches(amplicon));
    }

    PairOutcome::Emitted(AlignedRecord {
        name: &pair.name,
        amplicon,
        seq,
        qual,
        cigar: annotation.cigar,
        edit_distance: annotation.edit_distance,
        score: aln.score,
        mapq: aln.score.min(opt.max_mapq as i32) as u8,
    })
}
