// SAM output
//
// Header: amplicon-list passthrough lines, then @RG, @PG and @CO.
// Records: one line per merged pair, unpaired (no mate fields), with
//   RG:Z  read group
//   NM:i  edit distance (every indel base plus qualifying mismatches)
//   AS:i  raw global alignment score (MAPQ holds the capped value)
//   CO:Z  amplicon ID

use std::io::{self, Write};

use crate::cigar;
use crate::reconcile::AlignedRecord;

pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Provenance shared by the SAM header and the stats report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    /// `<PREFIX>_<FLOWCELL>`, or `<PREFIX>` without a flowcell
    pub read_group_id: String,
    pub sample: String,
    pub command_line: String,
    pub program: String,
    pub version: String,
}

impl RunInfo {
    pub fn new(prefix: &str, flowcell: Option<&str>, command_line: &str) -> Self {
        let read_group_id = match flowcell {
            Some(fc) if !fc.is_empty() => format!("{}_{}", prefix, fc),
            _ => prefix.to_string(),
        };
        Self {
            read_group_id,
            sample: prefix.to_string(),
            command_line: command_line.to_string(),
            program: PROGRAM_NAME.to_string(),
            version: PROGRAM_VERSION.to_string(),
        }
    }
}

/// Write the SAM header.
pub fn write_header<W: Write>(out: &mut W, passthrough: &[String], run: &RunInfo) -> io::Result<()> {
    if passthrough.is_empty() {
        log::warn!(
            "No SAM headers were provided in the amplicon list; add @SQ lines manually to pass SAM validation"
        );
    }
    for line in passthrough {
        writeln!(out, "{}", line)?;
    }

    writeln!(
        out,
        "@RG\tID:{}\tSM:{}\tPL:ILLUMINA\tLB:{}",
        run.read_group_id, run.sample, run.sample
    )?;
    writeln!(
        out,
        "@PG\tID:{}\tPN:{}\tCL:{}\tVN:{}",
        run.program, run.program, run.command_line, run.version
    )?;
    writeln!(
        out,
        "@CO\tReads were globally aligned using amplicon specific reference sequences"
    )?;
    Ok(())
}

/// Write one alignment line.
pub fn write_record<W: Write>(out: &mut W, rec: &AlignedRecord<'_>, read_group_id: &str) -> io::Result<()> {
    write!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t*\t0\t0\t",
        rec.name,
        rec.flag(),
        rec.amplicon.chrom,
        rec.amplicon.position,
        rec.mapq,
        cigar::to_string(&rec.cigar)
    )?;
    out.write_all(&rec.seq)?;
    out.write_all(b"\t")?;
    out.write_all(&rec.qual)?;
    writeln!(
        out,
        "\tRG:Z:{}\tNM:i:{}\tAS:i:{}\tCO:Z:{}",
        read_group_id, rec.edit_distance, rec.score, rec.amplicon.id
    )
}
