use std::convert::TryFrom;

use thiserror::Error;

use crate::cigar::{Cigar, CigarError};
use crate::position::adjusted_start;

/// Flag bit marking a read mapped to the reverse strand.
pub const REVERSE_COMPLEMENTED: u16 = 0x10;

const MIN_FIELDS: usize = 6;

/// Returns true for SAM header lines.
pub fn is_header(line: &[u8]) -> bool {
    line.first() == Some(&b'@')
}

/// Strips the line terminator (`\n` or `\r\n`).
pub fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Field view over a single data line. The record borrows the line it was parsed from, the line
/// itself is what gets written to the output.
#[derive(Debug)]
pub struct UmiRecord<'a> {
    read_name: &'a [u8],
    flags: u16,
    chrom: &'a [u8],
    position: i64,
    cigar: Cigar,
}

impl<'a> TryFrom<&'a [u8]> for UmiRecord<'a> {
    type Error = RecordError;

    fn try_from(line: &'a [u8]) -> Result<UmiRecord<'a>, Self::Error> {
        let mut fields = trim_eol(line).split(|&b| b == b'\t');
        let mut next = |n| fields.next().ok_or(RecordError::TooFewFields(n));

        let read_name = next(0)?;
        let flags = next(1)?;
        let chrom = next(2)?;
        let position = next(3)?;
        let _mapq = next(4)?;
        let cigar = next(5)?;

        let flags: u16 = lexical_core::parse(flags).map_err(|_| RecordError::Flags(lossy(flags)))?;
        let position: i64 = lexical_core::parse(position)
            .map_err(|_| RecordError::Position(lossy(position)))?;
        let cigar = Cigar::try_from(cigar).map_err(|e| RecordError::Cigar(lossy(cigar), e))?;

        Ok(UmiRecord { read_name, flags, chrom, position, cigar })
    }
}

impl<'a> UmiRecord<'a> {
    /// The UMI is the last `:` separated part of the read name.
    pub fn umi(&self) -> &'a [u8] {
        umi_from_read_name(self.read_name)
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn is_plus_strand(&self) -> bool {
        self.flags & REVERSE_COMPLEMENTED == 0
    }

    pub fn chrom(&self) -> &'a [u8] {
        self.chrom
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn cigar(&self) -> &Cigar {
        &self.cigar
    }

    /// Clip corrected 5' start, see [`adjusted_start`].
    pub fn dedup_start(&self) -> i64 {
        adjusted_start(self.position, self.is_plus_strand(), &self.cigar)
    }
}

pub fn umi_from_read_name(name: &[u8]) -> &[u8] {
    name.rsplit(|&b| b == b':').next().unwrap_or(name)
}

fn lossy(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected at least {} tab separated fields, missing field {}", MIN_FIELDS, .0 + 1)]
    TooFewFields(usize),
    #[error("invalid flag field `{0}`")]
    Flags(String),
    #[error("invalid position field `{0}`")]
    Position(String),
    #[error("invalid alignment descriptor `{0}`: {1}")]
    Cigar(String, #[source] CigarError),
}
