use std::convert::TryFrom;
use std::fmt;
use std::ops::Deref;

use smallvec::SmallVec;
use thiserror::Error;

/// Alignment operation code of a CIGAR element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Pad,
    SequenceMatch,
    SequenceMismatch,
    /// Any other operation byte. Tolerated by the parser, never counted.
    Other(u8),
}

impl From<u8> for Kind {
    fn from(b: u8) -> Kind {
        match b {
            b'M' => Kind::Match,
            b'I' => Kind::Insertion,
            b'D' => Kind::Deletion,
            b'N' => Kind::Skip,
            b'S' => Kind::SoftClip,
            b'H' => Kind::HardClip,
            b'P' => Kind::Pad,
            b'=' => Kind::SequenceMatch,
            b'X' => Kind::SequenceMismatch,
            other => Kind::Other(other),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Op {
    kind: Kind,
    len: u32,
}

impl Op {
    pub fn new(kind: Kind, len: u32) -> Op {
        Op { kind, len }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn len(&self) -> u32 {
        self.len
    }
}

/// A parsed alignment-shape descriptor. Most reads carry only a handful of operations, so they
/// are kept inline.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Cigar(SmallVec<[Op; 6]>);

impl Deref for Cigar {
    type Target = [Op];

    fn deref(&self) -> &[Op] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Cigar {
    type Error = CigarError;

    /// Parses run-length encoded `(length, operation)` pairs, e.g. `5S90M`.
    ///
    /// Clips are only accepted at the ends of the descriptor: a hard clip must be the first or
    /// last operation and a soft clip may only be preceded (or followed) by a hard clip.
    fn try_from(s: &[u8]) -> Result<Cigar, CigarError> {
        if s.is_empty() || s == b"*" {
            return Err(CigarError::Empty);
        }

        let mut ops = SmallVec::new();
        let mut start = 0;
        for (i, &b) in s.iter().enumerate() {
            if b.is_ascii_digit() {
                continue;
            }
            if start == i {
                return Err(CigarError::MissingLength(i));
            }
            let len: u32 = lexical_core::parse(&s[start..i]).map_err(|_| CigarError::Length(i))?;
            if len == 0 {
                return Err(CigarError::ZeroLength(start));
            }
            ops.push(Op::new(Kind::from(b), len));
            start = i + 1;
        }
        if start != s.len() {
            return Err(CigarError::TrailingLength);
        }

        let cigar = Cigar(ops);
        cigar.check_clips()?;
        Ok(cigar)
    }
}

impl Cigar {
    fn check_clips(&self) -> Result<(), CigarError> {
        let last = self.len() - 1;
        for (i, op) in self.iter().enumerate() {
            let at_end = i == 0 || i == last;
            let ok = match op.kind() {
                Kind::HardClip => at_end,
                Kind::SoftClip => {
                    at_end
                        || (i == 1 && self[0].kind() == Kind::HardClip)
                        || (i + 1 == last && self[last].kind() == Kind::HardClip)
                }
                _ => true,
            };
            if !ok {
                return Err(CigarError::InteriorClip(i));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in self.iter() {
            let code = match op.kind() {
                Kind::Match => b'M',
                Kind::Insertion => b'I',
                Kind::Deletion => b'D',
                Kind::Skip => b'N',
                Kind::SoftClip => b'S',
                Kind::HardClip => b'H',
                Kind::Pad => b'P',
                Kind::SequenceMatch => b'=',
                Kind::SequenceMismatch => b'X',
                Kind::Other(b) => b,
            };
            write!(f, "{}{}", op.len(), code as char)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CigarError {
    #[error("empty alignment descriptor")]
    Empty,
    #[error("operation without length at offset {0}")]
    MissingLength(usize),
    #[error("invalid operation length before offset {0}")]
    Length(usize),
    #[error("zero length operation at offset {0}")]
    ZeroLength(usize),
    #[error("length without operation at end of descriptor")]
    TrailingLength,
    #[error("clip operation in interior position {0}")]
    InteriorClip(usize),
}
