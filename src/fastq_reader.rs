// Paired FASTQ reader using bio::io::fastq
//
// Wraps two bio::io::fastq readers that are consumed in lockstep:
// - Automatic gzip detection by file extension (multi-member gzip supported)
// - Batch reading of read pairs for the evaluation pipeline
// - Header synchronisation checks between the two mate files
//
// Illumina headers look like
//   @M00766:51:000000000-A3FNU:1:1101:15589:1331 1:N:0:ACAGTG
// where the comment carries the mate number first and the sample index last.

use anyhow::{Context, Result, anyhow, bail};
use bio::io::fastq;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::defaults::HEADER_CHECK_PAIRS;

/// One sequencing fragment: both mates as read from their files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub name: String,
    pub seq1: Vec<u8>,
    pub qual1: Vec<u8>,
    pub seq2: Vec<u8>,
    pub qual2: Vec<u8>,
}

/// Single FASTQ stream with automatic gzip detection
pub struct FastqReader {
    path: PathBuf,
    records: fastq::Records<BufReader<Box<dyn Read + Send>>>,
}

impl FastqReader {
    /// Open a FASTQ file (auto-detects gzip by .gz extension)
    ///
    /// # Arguments
    /// * `path` - Path to FASTQ file (.fq, .fastq, .fq.gz, .fastq.gz)
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Unable to open FASTQ file {}", path.display()))?;

        let reader: Box<dyn Read + Send> =
            if path.extension().is_some_and(|ext| ext == "gz") {
                Box::new(MultiGzDecoder::new(file))
            } else {
                Box::new(file)
            };

        // Reader::new() internally wraps in BufReader
        Ok(Self {
            path: path.to_path_buf(),
            records: fastq::Reader::new(reader).records(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next record, `None` at EOF
    pub fn next_record(&mut self) -> Option<Result<fastq::Record>> {
        self.records.next().map(|rec| {
            rec.with_context(|| format!("Problem reading FASTQ file {}", self.path.display()))
        })
    }
}

/// Lockstep reader over the mate 1 and mate 2 files.
pub struct PairedFastqReader {
    mate1: FastqReader,
    mate2: FastqReader,
    pairs_read: usize,
    sample_index: Option<String>,
}

impl PairedFastqReader {
    pub fn new(read1: &Path, read2: &Path) -> Result<Self> {
        Ok(Self {
            mate1: FastqReader::new(read1)?,
            mate2: FastqReader::new(read2)?,
            pairs_read: 0,
            sample_index: None,
        })
    }

    /// Number of pairs returned so far
    pub fn pairs_read(&self) -> usize {
        self.pairs_read
    }

    /// Sample index taken from the first pair's comment
    pub fn sample_index(&self) -> Option<&str> {
        self.sample_index.as_deref()
    }

    /// Read up to `batch_size` pairs. Returns an empty batch at EOF.
    ///
    /// Fails when the files fall out of step: differing read names, one file
    /// ending before the other, or (for the first pairs) wrong mate numbers
    /// and mixed sample indexes.
    pub fn read_batch(&mut self, batch_size: usize) -> Result<Vec<ReadPair>> {
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            let (rec1, rec2) = match (self.mate1.next_record(), self.mate2.next_record()) {
                (Some(r1), Some(r2)) => (r1?, r2?),
                (None, None) => break,
                (Some(_), None) => bail!(
                    "{} has more reads than {}",
                    self.mate1.path().display(),
                    self.mate2.path().display()
                ),
                (None, Some(_)) => bail!(
                    "{} has more reads than {}",
                    self.mate2.path().display(),
                    self.mate1.path().display()
                ),
            };

            self.pairs_read += 1;
            let pair_no = self.pairs_read;
            self.validate_pair(&rec1, &rec2)
                .with_context(|| format!("FASTQ read pair {}", pair_no))?;

            batch.push(ReadPair {
                name: read_name(rec1.id()).to_string(),
                seq1: rec1.seq().to_vec(),
                qual1: rec1.qual().to_vec(),
                seq2: rec2.seq().to_vec(),
                qual2: rec2.qual().to_vec(),
            });
        }

        Ok(batch)
    }

    fn validate_pair(&mut self, rec1: &fastq::Record, rec2: &fastq::Record) -> Result<()> {
        for (rec, reader) in [(rec1, &self.mate1), (rec2, &self.mate2)] {
            if rec.seq().len() != rec.qual().len() {
                bail!(
                    "{}: read {} has {} bases but {} quality values",
                    reader.path().display(),
                    rec.id(),
                    rec.seq().len(),
                    rec.qual().len()
                );
            }
        }

        let (name1, name2) = (read_name(rec1.id()), read_name(rec2.id()));
        if name1 != name2 {
            bail!(
                "Read header {} does not match {}: FASTQ read headers are not synchronised",
                name1,
                name2
            );
        }

        if self.pairs_read > HEADER_CHECK_PAIRS {
            return Ok(());
        }

        for (rec, reader, expected) in [(rec1, &self.mate1, '1'), (rec2, &self.mate2, '2')] {
            let mate = rec.desc().and_then(mate_number);
            if mate != Some(expected) {
                bail!(
                    "{} contains R{} reads, expected R{}",
                    reader.path().display(),
                    mate.map_or_else(|| "?".to_string(), |m| m.to_string()),
                    expected
                );
            }
        }

        let index1 = rec1.desc().map(sample_index).unwrap_or_default();
        let index2 = rec2.desc().map(sample_index).unwrap_or_default();
        if index1 != index2 {
            bail!(
                "Index in read headers {} and {} do not match",
                index1,
                index2
            );
        }

        let first = self
            .sample_index
            .get_or_insert_with(|| index1.to_string());
        if first.as_str() != index1 {
            return Err(anyhow!(
                "Read headers contain mixed indexes ({} and {})",
                first,
                index1
            ));
        }

        Ok(())
    }
}

/// Read name without a trailing `/1` or `/2` mate suffix
pub fn read_name(id: &str) -> &str {
    id.strip_suffix("/1")
        .or_else(|| id.strip_suffix("/2"))
        .unwrap_or(id)
}

/// Mate number: first character of the header comment
pub fn mate_number(comment: &str) -> Option<char> {
    comment.chars().next()
}

/// Sample index: text after the last ':' of the header comment
pub fn sample_index(comment: &str) -> &str {
    comment.rsplit(':').next().unwrap_or(comment)
}

/// Flowcell ID from an Illumina read name.
///
/// Third ':'-separated field, minus any run prefix up to the first '-'
/// (`000000000-A3FNU` -> `A3FNU`). `None` when the name has fewer fields.
pub fn flowcell_id(name: &str) -> Option<String> {
    let field = name.split(':').filter(|f| !f.is_empty()).nth(2)?;
    let flowcell = field.split_once('-').map_or(field, |(_, rest)| rest);
    Some(flowcell.to_string())
}
