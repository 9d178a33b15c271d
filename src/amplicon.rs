// Amplicon templates and the amplicon list parser
//
// List format, one amplicon per tab-separated line:
//
//   ID  Chrom  Start  RefSequence  LeftPrimerLength  RightPrimerLength  Strand(+/-)
//
// Blank lines and '#' lines are skipped; '@' lines are SAM header lines
// passed through to the output unchanged.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::defaults::PRIMER_ANCHOR_LEN;
use crate::sequence::{is_unambiguous_dna, reverse_complement};

const EXPECTED_FIELDS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }

    /// SAM FLAG for records aligned to an amplicon on this strand
    pub fn sam_flag(self) -> u16 {
        match self {
            Strand::Forward => 0,
            Strand::Reverse => 16,
        }
    }
}

/// One amplicon's reference context. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpliconTemplate {
    pub id: String,
    pub chrom: String,
    /// 1-based position reported in SAM, first base after the upstream primer
    pub position: u64,
    /// Reference in 5'->3' orientation of the amplicon's strand
    pub reference: Vec<u8>,
    /// Prefix of the listed reference
    pub left_primer: Vec<u8>,
    /// Prefix of the listed reference's reverse complement
    pub right_primer: Vec<u8>,
    pub strand: Strand,
}

impl AmpliconTemplate {
    /// Build a template from a listed reference sequence.
    ///
    /// `listed_reference` is the sequence as it appears in the amplicon list;
    /// primers are derived from it, then reverse-strand references are stored
    /// reverse-complemented. `position` is the already-adjusted SAM position.
    pub fn new(
        id: &str,
        chrom: &str,
        position: u64,
        listed_reference: &[u8],
        left_primer_len: usize,
        right_primer_len: usize,
        strand: Strand,
    ) -> Result<Self> {
        if listed_reference.is_empty() {
            bail!("{}: reference sequence is empty", id);
        }
        if !is_unambiguous_dna(listed_reference) {
            bail!("{}: sequence contains non-standard bases", id);
        }
        if left_primer_len + right_primer_len > listed_reference.len() {
            bail!(
                "{}: primer lengths {} + {} exceed reference length {}",
                id,
                left_primer_len,
                right_primer_len,
                listed_reference.len()
            );
        }

        let reverse = reverse_complement(listed_reference);
        let left_primer = listed_reference[..left_primer_len].to_vec();
        let right_primer = reverse[..right_primer_len].to_vec();
        let reference = match strand {
            Strand::Forward => listed_reference.to_vec(),
            Strand::Reverse => reverse,
        };

        Ok(Self {
            id: id.to_string(),
            chrom: chrom.to_string(),
            position,
            reference,
            left_primer,
            right_primer,
            strand,
        })
    }

    /// (left, right) primer lengths in the stored reference's orientation
    pub fn oriented_primer_lengths(&self) -> (usize, usize) {
        match self.strand {
            Strand::Forward => (self.left_primer.len(), self.right_primer.len()),
            Strand::Reverse => (self.right_primer.len(), self.left_primer.len()),
        }
    }
}

/// Parsed amplicon list: templates in file order plus SAM header passthrough.
#[derive(Debug, Clone, Default)]
pub struct AmpliconList {
    pub templates: Vec<AmpliconTemplate>,
    pub sam_headers: Vec<String>,
}

impl AmpliconList {
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Load an amplicon list from disk.
pub fn load_amplicons(path: &Path) -> Result<AmpliconList> {
    let file = File::open(path)
        .with_context(|| format!("Unable to open amplicon file {}", path.display()))?;
    let list = parse_amplicons(BufReader::new(file))
        .with_context(|| format!("Amplicon list {} improperly formatted", path.display()))?;

    log::info!(
        "Loaded {} amplicons and {} SAM header lines from {}",
        list.len(),
        list.sam_headers.len(),
        path.display()
    );
    Ok(list)
}

/// Parse an amplicon list from any buffered reader.
pub fn parse_amplicons<R: BufRead>(reader: R) -> Result<AmpliconList> {
    let mut list = AmpliconList::default();
    let mut seen_ids = HashSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('@') {
            list.sam_headers.push(line.to_string());
            continue;
        }

        let template = parse_record(line).with_context(|| format!("line {}", line_no))?;
        if !seen_ids.insert(template.id.clone()) {
            bail!("line {}: duplicate amplicon ID {}", line_no, template.id);
        }

        log::debug!(
            "Amplicon {} {}:{} ({}) primers {}/{} bp, reference {} bp",
            template.id,
            template.chrom,
            template.position,
            template.strand.symbol(),
            template.left_primer.len(),
            template.right_primer.len(),
            template.reference.len()
        );
        list.templates.push(template);
    }

    Ok(list)
}

fn parse_record(line: &str) -> Result<AmpliconTemplate> {
    // Runs of tabs count as one separator
    let fields: Vec<&str> = line.split('\t').filter(|f| !f.is_empty()).collect();
    if fields.len() != EXPECTED_FIELDS {
        bail!(
            "expected {} tab-separated fields \
             (AmpliconName Chr Start RefSequence LeftPrimerLength RightPrimerLength Strand(+/-)), got {}",
            EXPECTED_FIELDS,
            fields.len()
        );
    }

    let id = fields[0];
    let chrom = fields[1];
    let start: u64 = fields[2]
        .parse()
        .map_err(|_| anyhow!("{}: invalid start position '{}'", id, fields[2]))?;
    let reference = fields[3].to_ascii_uppercase();
    let left_len: usize = fields[4]
        .parse()
        .map_err(|_| anyhow!("{}: invalid left primer length '{}'", id, fields[4]))?;
    let right_len: usize = fields[5]
        .parse()
        .map_err(|_| anyhow!("{}: invalid right primer length '{}'", id, fields[5]))?;
    let strand = Strand::from_symbol(fields[6])
        .ok_or_else(|| anyhow!("{}: strand field must be + or -, got '{}'", id, fields[6]))?;

    if left_len <= PRIMER_ANCHOR_LEN || right_len <= PRIMER_ANCHOR_LEN {
        log::warn!(
            "{}: primers of {} bp or less must match exactly (left {}, right {})",
            id,
            PRIMER_ANCHOR_LEN,
            left_len,
            right_len
        );
    }

    // Report the first base after the primer that sits upstream on the genome
    let upstream = match strand {
        Strand::Forward => left_len,
        Strand::Reverse => right_len,
    };

    AmpliconTemplate::new(
        id,
        chrom,
        start + upstream as u64,
        reference.as_bytes(),
        left_len,
        right_len,
        strand,
    )
}
